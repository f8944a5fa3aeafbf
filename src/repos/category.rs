use acl::Action;
use errors::Error;
use models::*;
use repos::types::*;
use types::*;

#[derive(Clone, Debug, Default)]
pub struct CategoryFilter {
    pub id: Option<CategoryId>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct SubcategoryFilter {
    pub id: Option<SubcategoryId>,
    pub category_id: Option<CategoryId>,
    pub is_active: Option<bool>,
}

pub trait CategoryRepo {
    fn create(&self, conn: RepoConnection, category: Category) -> RepoResult<Category>;
    /// Sorted by name
    fn get(&self, conn: RepoConnection, mask: CategoryFilter) -> RepoResult<Vec<Category>>;
    fn update(&self, conn: RepoConnection, id: CategoryId, data: CategoryUpdate) -> RepoResult<Category>;
    fn create_subcategory(&self, conn: RepoConnection, subcategory: Subcategory) -> RepoResult<Subcategory>;
    /// Sorted by name
    fn get_subcategories(&self, conn: RepoConnection, mask: SubcategoryFilter) -> RepoResult<Vec<Subcategory>>;
    fn update_subcategory(&self, conn: RepoConnection, id: SubcategoryId, data: CategoryUpdate) -> RepoResult<Subcategory>;
}

pub struct CategoryRepoImpl {
    acl: Option<Caller>,
}

type Repo = CategoryRepoImpl;

pub fn make_su_repo() -> Repo {
    CategoryRepoImpl { acl: None }
}

pub fn make_repo(caller: Caller) -> Repo {
    CategoryRepoImpl { acl: Some(caller) }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl CategoryRepo for CategoryRepoImpl {
    fn create(&self, conn: RepoConnection, category: Category) -> RepoResult<Category> {
        ensure_access(&self.acl, &[category.clone()], Action::Write)?;

        if conn.categories.iter().any(|c| same_name(&c.name, &category.name)) {
            return Err(format_err!("Category {} already exists", category.name)
                .context(Error::AlreadyExists)
                .into());
        }

        conn.categories.push(category.clone());
        Ok(category)
    }

    fn get(&self, conn: RepoConnection, mask: CategoryFilter) -> RepoResult<Vec<Category>> {
        let mut rows = conn
            .categories
            .iter()
            .filter(|c| mask.id.map(|v| v == c.id).unwrap_or(true))
            .filter(|c| mask.is_active.map(|v| v == c.is_active).unwrap_or(true))
            .cloned()
            .collect::<Vec<_>>();
        ensure_access(&self.acl, &rows, Action::Read)?;

        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn update(&self, conn: RepoConnection, id: CategoryId, data: CategoryUpdate) -> RepoResult<Category> {
        if let Some(ref name) = data.name {
            if conn.categories.iter().any(|c| c.id != id && same_name(&c.name, name)) {
                return Err(format_err!("Category {} already exists", name)
                    .context(Error::AlreadyExists)
                    .into());
            }
        }

        let category = conn
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| format_err!("Category {} not found", id).context(Error::NotFound))?;
        ensure_access(&self.acl, &[category.clone()], Action::Write)?;

        if let Some(name) = data.name {
            category.name = name;
        }
        if let Some(description) = data.description {
            category.description = Some(description);
        }
        if let Some(image_url) = data.image_url {
            category.image_url = Some(image_url);
        }
        if let Some(is_active) = data.is_active {
            category.is_active = is_active;
        }
        Ok(category.clone())
    }

    fn create_subcategory(&self, conn: RepoConnection, subcategory: Subcategory) -> RepoResult<Subcategory> {
        ensure_access(&self.acl, &[subcategory.clone()], Action::Write)?;

        if !conn.categories.iter().any(|c| c.id == subcategory.category_id) {
            return Err(format_err!("Category {} not found", subcategory.category_id)
                .context(Error::NotFound)
                .into());
        }
        if conn
            .subcategories
            .iter()
            .any(|s| s.category_id == subcategory.category_id && same_name(&s.name, &subcategory.name))
        {
            return Err(format_err!("Subcategory {} already exists", subcategory.name)
                .context(Error::AlreadyExists)
                .into());
        }

        conn.subcategories.push(subcategory.clone());
        Ok(subcategory)
    }

    fn get_subcategories(&self, conn: RepoConnection, mask: SubcategoryFilter) -> RepoResult<Vec<Subcategory>> {
        let mut rows = conn
            .subcategories
            .iter()
            .filter(|s| mask.id.map(|v| v == s.id).unwrap_or(true))
            .filter(|s| mask.category_id.map(|v| v == s.category_id).unwrap_or(true))
            .filter(|s| mask.is_active.map(|v| v == s.is_active).unwrap_or(true))
            .cloned()
            .collect::<Vec<_>>();
        ensure_access(&self.acl, &rows, Action::Read)?;

        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn update_subcategory(&self, conn: RepoConnection, id: SubcategoryId, data: CategoryUpdate) -> RepoResult<Subcategory> {
        let subcategory = conn
            .subcategories
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| format_err!("Subcategory {} not found", id).context(Error::NotFound))?;
        ensure_access(&self.acl, &[subcategory.clone()], Action::Write)?;

        if let Some(name) = data.name {
            subcategory.name = name;
        }
        if let Some(description) = data.description {
            subcategory.description = Some(description);
        }
        if let Some(is_active) = data.is_active {
            subcategory.is_active = is_active;
        }
        Ok(subcategory.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use errors::kind_of;

    fn category(name: &str) -> Category {
        Category {
            id: CategoryId::new(),
            name: name.to_string(),
            description: None,
            image_url: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn subcategory(category_id: CategoryId, name: &str) -> Subcategory {
        Subcategory {
            id: SubcategoryId::new(),
            category_id,
            name: name.to_string(),
            description: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn names_are_unique_per_parent() {
        let mut tables = Tables::default();
        let repo = make_su_repo();

        let dairy = repo.create(&mut tables, category("Dairy")).unwrap();
        let bakery = repo.create(&mut tables, category("Bakery")).unwrap();
        let e = repo.create(&mut tables, category("DAIRY")).unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::AlreadyExists));

        let e = repo
            .update(
                &mut tables,
                bakery.id,
                CategoryUpdate {
                    name: Some("dairy".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::AlreadyExists));

        repo.create_subcategory(&mut tables, subcategory(dairy.id, "Cheese")).unwrap();
        repo.create_subcategory(&mut tables, subcategory(bakery.id, "Cheese")).unwrap();
        let e = repo
            .create_subcategory(&mut tables, subcategory(dairy.id, "cheese"))
            .unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::AlreadyExists));

        let e = repo
            .create_subcategory(&mut tables, subcategory(CategoryId::new(), "Paneer"))
            .unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::NotFound));

        let names = repo
            .get(&mut tables, CategoryFilter::default())
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Bakery".to_string(), "Dairy".to_string()]);
    }

    #[test]
    fn customers_cannot_edit_categories() {
        let mut tables = Tables::default();
        let repo = make_repo(Caller::b2c(UserId::new()));

        let e = repo.create(&mut tables, category("Snacks")).unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::Forbidden));
        assert!(repo.get(&mut tables, CategoryFilter::default()).unwrap().is_empty());
    }
}
