use chrono::prelude::*;

use super::types::*;
use acl;
use config::Config;
use errors::{self, Error};
use models::*;
use pricing;
use repos::*;
use types::*;

/// Categories and products. Reads are open to everyone, changes need an administrator.
pub trait CatalogService {
    fn create_category(&self, payload: NewCategory) -> ServiceResult<Category>;
    /// Active categories by name, each with its active subcategories
    fn list_categories(&self) -> ServiceResult<Vec<CategoryTree>>;
    fn update_category(&self, category_id: CategoryId, payload: CategoryUpdate) -> ServiceResult<Category>;
    fn delete_category(&self, category_id: CategoryId) -> ServiceResult<Category>;
    fn create_subcategory(&self, payload: NewSubcategory) -> ServiceResult<Subcategory>;
    fn update_subcategory(&self, subcategory_id: SubcategoryId, payload: CategoryUpdate) -> ServiceResult<Subcategory>;
    fn delete_subcategory(&self, subcategory_id: SubcategoryId) -> ServiceResult<Subcategory>;
    fn create_product(&self, payload: NewProduct) -> ServiceResult<Product>;
    fn update_product(&self, product_id: ProductId, payload: ProductUpdate) -> ServiceResult<Product>;
    fn delete_product(&self, product_id: ProductId) -> ServiceResult<Product>;
    /// Active products, newest first, priced for the given channel
    fn list_products(&self, account_type: AccountType, search: ProductSearch) -> ServiceResult<Vec<ProductView>>;
    fn get_product(&self, product_id: ProductId, account_type: AccountType) -> ServiceResult<ProductView>;
}

pub struct CatalogServiceImpl {
    ctx: ServiceContext,
    caller: Caller,
}

impl CatalogServiceImpl {
    pub fn new(ctx: ServiceContext, caller: Caller) -> Self {
        Self { ctx, caller }
    }
}

/// Product as shown to a customer of the given channel
pub fn product_view(product: Product, account_type: AccountType) -> ProductView {
    let available_stock = product.reserved_stock(account_type);
    match account_type {
        AccountType::B2c => ProductView::B2c(B2cProductView {
            product_id: product.id,
            discount_percentage: pricing::discount_percentage(product.b2c_mrp, product.b2c_selling_price),
            name: product.name,
            brand: product.brand,
            sku: product.sku,
            unit: product.unit,
            mrp: product.b2c_mrp,
            selling_price: product.b2c_selling_price,
            max_quantity: product.b2c_max_quantity,
            in_stock: available_stock > 0,
            available_stock,
        }),
        AccountType::B2b => ProductView::B2b(B2bProductView {
            product_id: product.id,
            name: product.name,
            brand: product.brand,
            sku: product.sku,
            unit: product.unit,
            base_price: product.b2b_base_price,
            min_order_qty: product.b2b_min_order_qty,
            max_order_qty: product.b2b_max_order_qty,
            bulk_tiers: product.b2b_bulk_tiers,
            in_stock: available_stock > 0,
            available_stock,
        }),
    }
}

/// Channel split for stock not assigned explicitly
fn default_reserves(config: &Config, total_stock: u32) -> (u32, u32) {
    let total = f64::from(total_stock);
    (
        (total * config.stock.b2c_share).floor() as u32,
        (total * config.stock.b2b_share).floor() as u32,
    )
}

fn check_prices(b2c_selling_price: ProductPrice, b2b_base_price: ProductPrice, tiers: &[BulkTier]) -> ServiceResult<()> {
    if b2b_base_price >= b2c_selling_price {
        return Err(Error::Validate(format!(
            "Wholesale base price {} must be lower than retail price {}",
            b2b_base_price, b2c_selling_price
        ))
        .into());
    }
    pricing::validate_tiers(tiers)
}

impl CatalogService for CatalogServiceImpl {
    fn create_category(&self, payload: NewCategory) -> ServiceResult<Category> {
        debug!("Creating category {}", payload.name);

        acl::check_admin(&self.caller)?;
        errors::validate(&payload)?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            repo_factory.create_category_repo(Some(caller)).create(
                conn,
                Category {
                    id: CategoryId::new(),
                    name: payload.name.trim().to_string(),
                    description: payload.description,
                    image_url: payload.image_url,
                    is_active: true,
                    created_at: Utc::now(),
                },
            )
        })
    }

    fn list_categories(&self) -> ServiceResult<Vec<CategoryTree>> {
        debug!("Listing categories");

        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let repo = repo_factory.create_category_repo(Some(caller));
            let categories = repo.get(
                conn,
                CategoryFilter {
                    is_active: Some(true),
                    ..Default::default()
                },
            )?;

            let mut out = Vec::with_capacity(categories.len());
            for category in categories {
                let subcategories = repo.get_subcategories(
                    conn,
                    SubcategoryFilter {
                        category_id: Some(category.id),
                        is_active: Some(true),
                        ..Default::default()
                    },
                )?;
                out.push(CategoryTree { category, subcategories });
            }
            Ok(out)
        })
    }

    fn update_category(&self, category_id: CategoryId, payload: CategoryUpdate) -> ServiceResult<Category> {
        debug!("Updating category {}", category_id);

        acl::check_admin(&self.caller)?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            repo_factory
                .create_category_repo(Some(caller))
                .update(conn, category_id, payload)
        })
    }

    fn delete_category(&self, category_id: CategoryId) -> ServiceResult<Category> {
        debug!("Deleting category {}", category_id);

        self.update_category(
            category_id,
            CategoryUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
    }

    fn create_subcategory(&self, payload: NewSubcategory) -> ServiceResult<Subcategory> {
        debug!("Creating subcategory {} in {}", payload.name, payload.category_id);

        acl::check_admin(&self.caller)?;
        errors::validate(&payload)?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            repo_factory.create_category_repo(Some(caller)).create_subcategory(
                conn,
                Subcategory {
                    id: SubcategoryId::new(),
                    category_id: payload.category_id,
                    name: payload.name.trim().to_string(),
                    description: payload.description,
                    is_active: true,
                    created_at: Utc::now(),
                },
            )
        })
    }

    fn update_subcategory(&self, subcategory_id: SubcategoryId, payload: CategoryUpdate) -> ServiceResult<Subcategory> {
        debug!("Updating subcategory {}", subcategory_id);

        acl::check_admin(&self.caller)?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            repo_factory
                .create_category_repo(Some(caller))
                .update_subcategory(conn, subcategory_id, payload)
        })
    }

    fn delete_subcategory(&self, subcategory_id: SubcategoryId) -> ServiceResult<Subcategory> {
        debug!("Deleting subcategory {}", subcategory_id);

        self.update_subcategory(
            subcategory_id,
            CategoryUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
    }

    fn create_product(&self, payload: NewProduct) -> ServiceResult<Product> {
        debug!("Creating product {} ({})", payload.name, payload.sku);

        acl::check_admin(&self.caller)?;
        errors::validate(&payload)?;
        check_prices(payload.b2c_selling_price, payload.b2b_base_price, &payload.b2b_bulk_tiers)?;

        let (b2c_default, b2b_default) = default_reserves(&self.ctx.config, payload.total_stock);
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let category = repo_factory
                .create_category_repo(None)
                .get(
                    conn,
                    CategoryFilter {
                        id: Some(payload.category_id),
                        ..Default::default()
                    },
                )?
                .pop()
                .ok_or_else(|| format_err!("Category {} not found", payload.category_id).context(Error::NotFound))?;

            if let Some(subcategory_id) = payload.subcategory_id {
                let known = repo_factory
                    .create_category_repo(None)
                    .get_subcategories(
                        conn,
                        SubcategoryFilter {
                            id: Some(subcategory_id),
                            category_id: Some(category.id),
                            ..Default::default()
                        },
                    )?;
                if known.is_empty() {
                    return Err(format_err!("Subcategory {} not found in {}", subcategory_id, category.name)
                        .context(Error::NotFound)
                        .into());
                }
            }

            let now = Utc::now();
            let product = repo_factory.create_product_repo(Some(caller)).create(
                conn,
                Product {
                    id: ProductId::new(),
                    sku: payload.sku,
                    name: payload.name,
                    category_id: category.id,
                    subcategory_id: payload.subcategory_id,
                    brand: payload.brand,
                    description: payload.description,
                    unit: payload.unit,
                    quantity_per_unit: payload.quantity_per_unit.unwrap_or(1.0),
                    is_vegetarian: payload.is_vegetarian,
                    expiry_date: payload.expiry_date,
                    b2c_mrp: payload.b2c_mrp,
                    b2c_selling_price: payload.b2c_selling_price,
                    b2c_min_quantity: payload.b2c_min_quantity.unwrap_or(Quantity(1)),
                    b2c_max_quantity: payload.b2c_max_quantity.unwrap_or(Quantity(10)),
                    b2b_base_price: payload.b2b_base_price,
                    b2b_min_order_qty: payload.b2b_min_order_qty,
                    b2b_max_order_qty: payload.b2b_max_order_qty,
                    b2b_bulk_tiers: payload.b2b_bulk_tiers,
                    total_stock: payload.total_stock,
                    b2c_reserved_stock: payload.b2c_reserved_stock.unwrap_or(b2c_default),
                    b2b_reserved_stock: payload.b2b_reserved_stock.unwrap_or(b2b_default),
                    status: ProductStatus::Active,
                    is_deleted: false,
                    created_at: now,
                    updated_at: now,
                },
            )?;

            info!("Product {} ({}) created in {}", product.name, product.sku, category.name);
            Ok(product)
        })
    }

    fn update_product(&self, product_id: ProductId, payload: ProductUpdate) -> ServiceResult<Product> {
        debug!("Updating product {}", product_id);

        acl::check_admin(&self.caller)?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let repo = repo_factory.create_product_repo(Some(caller));
            let current = repo
                .find(conn, product_id)?
                .filter(|product| !product.is_deleted)
                .ok_or_else(|| format_err!("Product {} not found", product_id).context(Error::NotFound))?;

            check_prices(
                payload.b2c_selling_price.unwrap_or(current.b2c_selling_price),
                payload.b2b_base_price.unwrap_or(current.b2b_base_price),
                payload.b2b_bulk_tiers.as_ref().unwrap_or(&current.b2b_bulk_tiers),
            )?;

            repo.update(
                conn,
                ProductUpdater {
                    mask: ProductFilter::by_id(product_id),
                    data: payload,
                },
            )?
            .pop()
            .ok_or_else(|| format_err!("Product {} not found", product_id).context(Error::NotFound).into())
        })
    }

    fn delete_product(&self, product_id: ProductId) -> ServiceResult<Product> {
        debug!("Deleting product {}", product_id);

        acl::check_admin(&self.caller)?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let product = repo_factory.create_product_repo(Some(caller)).delete(conn, product_id)?;
            info!("Product {} ({}) deleted", product.name, product.sku);
            Ok(product)
        })
    }

    fn list_products(&self, account_type: AccountType, search: ProductSearch) -> ServiceResult<Vec<ProductView>> {
        debug!("Listing {} products with {:?}", account_type, search);

        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let products = repo_factory.create_product_repo(Some(caller)).get(
                conn,
                ProductFilter {
                    category_id: search.category_id,
                    subcategory_id: search.subcategory_id,
                    search: search.search.filter(|s| !s.trim().is_empty()),
                    status: Some(ProductStatus::Active),
                    is_deleted: Some(false),
                    ..Default::default()
                },
            )?;
            Ok(products.into_iter().map(|p| product_view(p, account_type)).collect())
        })
    }

    fn get_product(&self, product_id: ProductId, account_type: AccountType) -> ServiceResult<ProductView> {
        debug!("Getting product {} for {}", product_id, account_type);

        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            repo_factory
                .create_product_repo(Some(caller))
                .find(conn, product_id)?
                .filter(|product| product.is_available())
                .map(|product| product_view(product, account_type))
                .ok_or_else(|| format_err!("Product {} not found", product_id).context(Error::NotFound).into())
        })
    }
}
