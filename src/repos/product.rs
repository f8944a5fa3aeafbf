use chrono::prelude::*;

use acl::Action;
use errors::Error;
use models::*;
use repos::types::*;
use types::*;

#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub id: Option<ProductId>,
    pub sku: Option<String>,
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    /// Case-insensitive match against name, brand and SKU
    pub search: Option<String>,
    pub status: Option<ProductStatus>,
    pub is_deleted: Option<bool>,
}

impl ProductFilter {
    pub fn by_id(id: ProductId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    fn matches(&self, product: &Product) -> bool {
        if let Some(id) = self.id {
            if product.id != id {
                return false;
            }
        }
        if let Some(ref sku) = self.sku {
            if &product.sku != sku {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if product.category_id != category_id {
                return false;
            }
        }
        if let Some(subcategory_id) = self.subcategory_id {
            if product.subcategory_id != Some(subcategory_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if product.status != status {
                return false;
            }
        }
        if let Some(is_deleted) = self.is_deleted {
            if product.is_deleted != is_deleted {
                return false;
            }
        }
        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            let hit = product.name.to_lowercase().contains(&needle)
                || product.sku.to_lowercase().contains(&needle)
                || product.brand.as_ref().map(|b| b.to_lowercase().contains(&needle)).unwrap_or(false);
            if !hit {
                return false;
            }
        }
        true
    }
}

#[derive(Clone, Debug)]
pub struct ProductUpdater {
    pub mask: ProductFilter,
    pub data: ProductUpdate,
}

pub trait ProductRepo {
    fn create(&self, conn: RepoConnection, product: Product) -> RepoResult<Product>;
    /// Newest first
    fn get(&self, conn: RepoConnection, mask: ProductFilter) -> RepoResult<Vec<Product>>;
    fn find(&self, conn: RepoConnection, id: ProductId) -> RepoResult<Option<Product>>;
    fn update(&self, conn: RepoConnection, updater: ProductUpdater) -> RepoResult<Vec<Product>>;
    /// Marks the product deleted and inactive
    fn delete(&self, conn: RepoConnection, id: ProductId) -> RepoResult<Product>;
    /// Takes units out of the channel reserve and the total stock
    fn take_stock(&self, conn: RepoConnection, id: ProductId, channel: AccountType, quantity: Quantity) -> RepoResult<Product>;
    /// Puts units back into the channel reserve and the total stock
    fn return_stock(&self, conn: RepoConnection, id: ProductId, channel: AccountType, quantity: Quantity) -> RepoResult<Product>;
}

pub struct ProductRepoImpl {
    acl: Option<Caller>,
}

type Repo = ProductRepoImpl;

pub fn make_su_repo() -> Repo {
    ProductRepoImpl { acl: None }
}

pub fn make_repo(caller: Caller) -> Repo {
    ProductRepoImpl { acl: Some(caller) }
}

fn apply_update(product: &mut Product, data: &ProductUpdate, now: DateTime<Utc>) {
    if let Some(ref v) = data.name {
        product.name = v.clone();
    }
    if let Some(ref v) = data.brand {
        product.brand = Some(v.clone());
    }
    if let Some(ref v) = data.description {
        product.description = Some(v.clone());
    }
    if let Some(v) = data.category_id {
        product.category_id = v;
    }
    if let Some(v) = data.subcategory_id {
        product.subcategory_id = Some(v);
    }
    if let Some(v) = data.quantity_per_unit {
        product.quantity_per_unit = v;
    }
    if let Some(v) = data.is_vegetarian {
        product.is_vegetarian = v;
    }
    if let Some(v) = data.expiry_date {
        product.expiry_date = Some(v);
    }
    if let Some(v) = data.b2c_mrp {
        product.b2c_mrp = v;
    }
    if let Some(v) = data.b2c_selling_price {
        product.b2c_selling_price = v;
    }
    if let Some(v) = data.b2c_min_quantity {
        product.b2c_min_quantity = v;
    }
    if let Some(v) = data.b2c_max_quantity {
        product.b2c_max_quantity = v;
    }
    if let Some(v) = data.b2b_base_price {
        product.b2b_base_price = v;
    }
    if let Some(v) = data.b2b_min_order_qty {
        product.b2b_min_order_qty = v;
    }
    if let Some(v) = data.b2b_max_order_qty {
        product.b2b_max_order_qty = v;
    }
    if let Some(ref v) = data.b2b_bulk_tiers {
        product.b2b_bulk_tiers = v.clone();
    }
    if let Some(v) = data.total_stock {
        product.total_stock = v;
    }
    if let Some(v) = data.b2c_reserved_stock {
        product.b2c_reserved_stock = v;
    }
    if let Some(v) = data.b2b_reserved_stock {
        product.b2b_reserved_stock = v;
    }
    if let Some(v) = data.status {
        product.status = v;
    }
    product.updated_at = now;
}

impl ProductRepoImpl {
    fn row_mut<'a>(&self, conn: &'a mut Tables, id: ProductId) -> RepoResult<&'a mut Product> {
        let product = conn
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| format_err!("Product {} not found", id).context(Error::NotFound))?;
        ensure_access(&self.acl, &[product.clone()], Action::Write)?;
        Ok(product)
    }
}

impl ProductRepo for ProductRepoImpl {
    fn create(&self, conn: RepoConnection, product: Product) -> RepoResult<Product> {
        ensure_access(&self.acl, &[product.clone()], Action::Write)?;

        if conn.products.iter().any(|p| p.sku == product.sku) {
            return Err(format_err!("Product with SKU {} already exists", product.sku)
                .context(Error::AlreadyExists)
                .into());
        }

        conn.products.push(product.clone());
        Ok(product)
    }

    fn get(&self, conn: RepoConnection, mask: ProductFilter) -> RepoResult<Vec<Product>> {
        let rows = conn.products.iter().filter(|p| mask.matches(p)).cloned().collect::<Vec<_>>();
        ensure_access(&self.acl, &rows, Action::Read)?;
        Ok(newest_first(rows, |p| p.created_at))
    }

    fn find(&self, conn: RepoConnection, id: ProductId) -> RepoResult<Option<Product>> {
        self.get(conn, ProductFilter::by_id(id)).map(|mut rows| rows.pop())
    }

    fn update(&self, conn: RepoConnection, updater: ProductUpdater) -> RepoResult<Vec<Product>> {
        let now = Utc::now();
        let ProductUpdater { mask, data } = updater;

        let mut out = vec![];
        for product in conn.products.iter_mut().filter(|p| mask.matches(p)) {
            ensure_access(&self.acl, &[product.clone()], Action::Write)?;
            apply_update(product, &data, now);
            out.push(product.clone());
        }
        Ok(out)
    }

    fn delete(&self, conn: RepoConnection, id: ProductId) -> RepoResult<Product> {
        let product = conn
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| format_err!("Product {} not found", id).context(Error::NotFound))?;
        ensure_access(&self.acl, &[product.clone()], Action::Delete)?;

        product.is_deleted = true;
        product.status = ProductStatus::Inactive;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    fn take_stock(&self, conn: RepoConnection, id: ProductId, channel: AccountType, quantity: Quantity) -> RepoResult<Product> {
        let product = self.row_mut(conn, id)?;

        let reserved = product.reserved_stock(channel);
        if reserved < quantity.0 || product.total_stock < quantity.0 {
            return Err(format_err!(
                "Insufficient {} stock for {}: requested {}, available {}",
                channel,
                product.name,
                quantity,
                reserved
            )
            .context(Error::InsufficientStock)
            .into());
        }

        match channel {
            AccountType::B2c => product.b2c_reserved_stock -= quantity.0,
            AccountType::B2b => product.b2b_reserved_stock -= quantity.0,
        }
        product.total_stock -= quantity.0;
        product.updated_at = Utc::now();

        Ok(product.clone())
    }

    fn return_stock(&self, conn: RepoConnection, id: ProductId, channel: AccountType, quantity: Quantity) -> RepoResult<Product> {
        let product = self.row_mut(conn, id)?;

        match channel {
            AccountType::B2c => product.b2c_reserved_stock += quantity.0,
            AccountType::B2b => product.b2b_reserved_stock += quantity.0,
        }
        product.total_stock += quantity.0;
        product.updated_at = Utc::now();

        Ok(product.clone())
    }
}
