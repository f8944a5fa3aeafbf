use uuid::Uuid;

#[derive(Clone, Copy, Debug, Display, Eq, FromStr, PartialEq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        UserId(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, FromStr, PartialEq, Hash, Serialize, Deserialize)]
pub struct BusinessId(pub Uuid);

impl BusinessId {
    pub fn new() -> Self {
        BusinessId(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, FromStr, PartialEq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub Uuid);

impl ProductId {
    pub fn new() -> Self {
        ProductId(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, FromStr, PartialEq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub Uuid);

impl CategoryId {
    pub fn new() -> Self {
        CategoryId(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, FromStr, PartialEq, Hash, Serialize, Deserialize)]
pub struct SubcategoryId(pub Uuid);

impl SubcategoryId {
    pub fn new() -> Self {
        SubcategoryId(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, FromStr, PartialEq, Hash, Serialize, Deserialize)]
pub struct CartId(pub Uuid);

impl CartId {
    pub fn new() -> Self {
        CartId(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, FromStr, PartialEq, Hash, Serialize, Deserialize)]
pub struct CartItemId(pub Uuid);

impl CartItemId {
    pub fn new() -> Self {
        CartItemId(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, FromStr, PartialEq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    pub fn new() -> Self {
        OrderId(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, FromStr, PartialEq, Hash, Serialize, Deserialize)]
pub struct OrderDiffId(pub Uuid);

impl OrderDiffId {
    pub fn new() -> Self {
        OrderDiffId(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, FromStr, PartialEq, Hash, Serialize, Deserialize)]
pub struct AddressId(pub Uuid);

impl AddressId {
    pub fn new() -> Self {
        AddressId(Uuid::new_v4())
    }
}

/// Money amount in rupees
#[derive(Clone, Copy, Debug, Default, Display, From, FromStr, Into, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ProductPrice(pub f64);

impl ProductPrice {
    /// Rounds to whole paise.
    pub fn round(self) -> Self {
        ProductPrice((self.0 * 100.0).round() / 100.0)
    }

    pub fn times(self, quantity: Quantity) -> Self {
        ProductPrice(self.0 * f64::from(quantity.0))
    }
}

#[derive(Clone, Copy, Debug, Default, Display, Eq, From, FromStr, Into, Ord, PartialEq, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Quantity(pub u32);
