#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetterPayload<T> {
    pub value: T,
}

/// One page of a newest-first listing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub pages: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Missing or zero values fall back to page 1 and `default_limit`.
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self {
            page: page.filter(|v| *v > 0).unwrap_or(1),
            limit: limit.filter(|v| *v > 0).unwrap_or(default_limit),
        }
    }

    pub fn skip(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    pub fn apply<T>(&self, all: Vec<T>) -> Page<T> {
        let total = all.len();
        let limit = self.limit as usize;
        let items = all.into_iter().skip(self.skip()).take(limit).collect();

        Page {
            items,
            page: self.page,
            limit: self.limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}
