use std::fmt;
use std::str::FromStr;

use errors::Error;
use types::*;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    #[serde(rename = "b2c")]
    B2c,
    #[serde(rename = "b2b")]
    B2b,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AccountType::B2c => write!(f, "b2c"),
            AccountType::B2b => write!(f, "b2b"),
        }
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "b2c" => Ok(AccountType::B2c),
            "b2b" => Ok(AccountType::B2b),
            _ => Err(Error::ParseError),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum UserRole {
    Customer,
    Admin,
}

/// Authenticated identity on whose behalf a service call is made
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub account_type: AccountType,
    pub business_id: Option<BusinessId>,
    pub role: UserRole,
}

impl Caller {
    pub fn b2c(user_id: UserId) -> Self {
        Self {
            user_id,
            account_type: AccountType::B2c,
            business_id: None,
            role: UserRole::Customer,
        }
    }

    pub fn b2b(user_id: UserId, business_id: Option<BusinessId>) -> Self {
        Self {
            user_id,
            account_type: AccountType::B2b,
            business_id,
            role: UserRole::Customer,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            account_type: AccountType::B2c,
            business_id: None,
            role: UserRole::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
