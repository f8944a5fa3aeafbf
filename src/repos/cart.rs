use acl::Action;
use errors::Error;
use models::*;
use repos::types::*;
use types::*;

#[derive(Clone, Debug, Default)]
pub struct CartFilter {
    pub id: Option<CartId>,
    pub user_id: Option<UserId>,
    pub account_type: Option<AccountType>,
}

impl CartFilter {
    fn matches(&self, cart: &Cart) -> bool {
        self.id.map(|v| v == cart.id).unwrap_or(true)
            && self.user_id.map(|v| v == cart.user_id).unwrap_or(true)
            && self.account_type.map(|v| v == cart.account_type).unwrap_or(true)
    }
}

pub trait CartRepo {
    fn create(&self, conn: RepoConnection, cart: Cart) -> RepoResult<Cart>;
    fn get(&self, conn: RepoConnection, mask: CartFilter) -> RepoResult<Vec<Cart>>;
    /// Cart of a user for one sales channel
    fn find_for_user(&self, conn: RepoConnection, user_id: UserId, account_type: AccountType) -> RepoResult<Option<Cart>>;
    /// Replaces the stored cart with the same id
    fn save(&self, conn: RepoConnection, cart: Cart) -> RepoResult<Cart>;
}

pub struct CartRepoImpl {
    acl: Option<Caller>,
}

type Repo = CartRepoImpl;

pub fn make_su_repo() -> Repo {
    CartRepoImpl { acl: None }
}

pub fn make_repo(caller: Caller) -> Repo {
    CartRepoImpl { acl: Some(caller) }
}

impl CartRepo for CartRepoImpl {
    fn create(&self, conn: RepoConnection, cart: Cart) -> RepoResult<Cart> {
        ensure_access(&self.acl, &[cart.clone()], Action::Write)?;

        if conn
            .carts
            .iter()
            .any(|c| c.user_id == cart.user_id && c.account_type == cart.account_type)
        {
            return Err(format_err!("User {} already has a {} cart", cart.user_id, cart.account_type)
                .context(Error::AlreadyExists)
                .into());
        }

        conn.carts.push(cart.clone());
        Ok(cart)
    }

    fn get(&self, conn: RepoConnection, mask: CartFilter) -> RepoResult<Vec<Cart>> {
        let rows = conn.carts.iter().filter(|c| mask.matches(c)).cloned().collect::<Vec<_>>();
        ensure_access(&self.acl, &rows, Action::Read)?;
        Ok(rows)
    }

    fn find_for_user(&self, conn: RepoConnection, user_id: UserId, account_type: AccountType) -> RepoResult<Option<Cart>> {
        self.get(
            conn,
            CartFilter {
                user_id: Some(user_id),
                account_type: Some(account_type),
                ..Default::default()
            },
        )
        .map(|mut rows| rows.pop())
    }

    fn save(&self, conn: RepoConnection, cart: Cart) -> RepoResult<Cart> {
        let stored = conn
            .carts
            .iter_mut()
            .find(|c| c.id == cart.id)
            .ok_or_else(|| format_err!("Cart {} not found", cart.id).context(Error::NotFound))?;
        ensure_access(&self.acl, &[stored.clone()], Action::Write)?;

        *stored = cart.clone();
        Ok(cart)
    }
}
