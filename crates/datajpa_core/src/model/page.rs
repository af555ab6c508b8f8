//! Paging and sorting shapes.
//!
//! # Responsibility
//! - Describe which slice of a filtered result set a caller wants.
//! - Carry the slice plus total/position metadata back to the caller.
//!
//! # Invariants
//! - Sort keys are a closed set mapped to fixed columns; caller text never
//!   reaches SQL.
//! - `Page` metadata is derived from `number`, `size` and `total_elements`
//!   only, so `map` cannot make it inconsistent.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Member attributes that can order a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberSortKey {
    Id,
    Username,
    Age,
}

impl MemberSortKey {
    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Username => "username",
            Self::Age => "age",
        }
    }
}

/// Rejected sort text (unknown property or direction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSortError(pub String);

impl Display for ParseSortError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported sort expression `{}`", self.0)
    }
}

impl std::error::Error for ParseSortError {}

impl FromStr for Direction {
    type Err = ParseSortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ParseSortError(value.to_string())),
        }
    }
}

impl FromStr for MemberSortKey {
    type Err = ParseSortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "id" => Ok(Self::Id),
            "username" => Ok(Self::Username),
            "age" => Ok(Self::Age),
            _ => Err(ParseSortError(value.to_string())),
        }
    }
}

/// One ordering term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub key: MemberSortKey,
    pub direction: Direction,
}

/// Ordered list of sort terms, applied left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    /// No explicit ordering; listings fall back to identifier order.
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(direction: Direction, key: MemberSortKey) -> Self {
        Self {
            orders: vec![Order { key, direction }],
        }
    }

    /// Appends a secondary term.
    pub fn and(mut self, direction: Direction, key: MemberSortKey) -> Self {
        self.orders.push(Order { key, direction });
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    /// Parses `property[,direction]`, e.g. `username,desc`.
    ///
    /// Direction defaults to ascending.
    pub fn parse(expression: &str) -> Result<Self, ParseSortError> {
        let mut parts = expression.split(',');
        let key = parts
            .next()
            .ok_or_else(|| ParseSortError(expression.to_string()))?
            .parse::<MemberSortKey>()
            .map_err(|_| ParseSortError(expression.to_string()))?;
        let direction = match parts.next() {
            Some(value) => value
                .parse::<Direction>()
                .map_err(|_| ParseSortError(expression.to_string()))?,
            None => Direction::Asc,
        };
        if parts.next().is_some() {
            return Err(ParseSortError(expression.to_string()));
        }
        Ok(Self::by(direction, key))
    }

    /// Renders an `ORDER BY` clause body. `id ASC` is always appended as a
    /// tie-breaker so page boundaries are deterministic.
    pub(crate) fn to_sql(&self) -> String {
        let mut terms: Vec<String> = self
            .orders
            .iter()
            .map(|order| format!("{} {}", order.key.column(), order.direction.as_sql()))
            .collect();
        if !self
            .orders
            .iter()
            .any(|order| order.key == MemberSortKey::Id)
        {
            terms.push("id ASC".to_string());
        }
        terms.join(", ")
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Sort,
}

impl PageRequest {
    pub fn of(page: u32, size: u32) -> Self {
        Self::of_sorted(page, size, Sort::unsorted())
    }

    pub fn of_sorted(page: u32, size: u32, sort: Sort) -> Self {
        Self { page, size, sort }
    }

    /// A zero-sized page cannot address any rows.
    pub fn is_valid(&self) -> bool {
        self.size > 0
    }

    /// Row offset of the first element of this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// A bounded, ordered slice of a filtered result set plus totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page,
            size: request.size,
            total_elements,
        }
    }

    /// Empty result for a request that cannot address any rows.
    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    /// Zero-based page index.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Requested page size (not the number of returned rows).
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            0
        } else {
            self.total_elements.div_ceil(u64::from(self.size))
        }
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Projects every element while keeping paging metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }

    /// Fallible projection; the first error aborts the whole page.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(Page {
            content: self
                .content
                .into_iter()
                .map(f)
                .collect::<Result<Vec<_>, E>>()?,
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        })
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Page", 11)?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("totalElements", &self.total_elements)?;
        state.serialize_field("totalPages", &self.total_pages())?;
        state.serialize_field("number", &self.number)?;
        state.serialize_field("size", &self.size)?;
        state.serialize_field("numberOfElements", &self.number_of_elements())?;
        state.serialize_field("first", &self.is_first())?;
        state.serialize_field("last", &self.is_last())?;
        state.serialize_field("hasNext", &self.has_next())?;
        state.serialize_field("hasPrevious", &self.has_previous())?;
        state.serialize_field("empty", &self.is_empty())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, MemberSortKey, Page, PageRequest, Sort};

    #[test]
    fn first_of_two_pages_reports_next() {
        let page = Page::new(vec![1, 2, 3], &PageRequest::of(0, 3), 5);
        assert_eq!(page.total_pages(), 2);
        assert!(page.is_first());
        assert!(page.has_next());
        assert!(!page.is_last());
        assert!(!page.has_previous());
    }

    #[test]
    fn last_page_has_no_next() {
        let page = Page::new(vec![4, 5], &PageRequest::of(1, 3), 5);
        assert_eq!(page.number_of_elements(), 2);
        assert!(!page.has_next());
        assert!(page.is_last());
        assert!(page.has_previous());
    }

    #[test]
    fn zero_size_request_yields_zero_pages() {
        let request = PageRequest::of(0, 0);
        assert!(!request.is_valid());
        let page: Page<i32> = Page::empty(&request);
        assert_eq!(page.total_pages(), 0);
        assert!(!page.has_next());
    }

    #[test]
    fn map_keeps_metadata() {
        let page = Page::new(vec![1, 2], &PageRequest::of(2, 2), 9).map(|n| n * 10);
        assert_eq!(page.content(), &[10, 20]);
        assert_eq!(page.number(), 2);
        assert_eq!(page.total_elements(), 9);
        assert_eq!(page.total_pages(), 5);
    }

    #[test]
    fn sort_parse_accepts_property_and_optional_direction() {
        assert_eq!(
            Sort::parse("username,desc").unwrap(),
            Sort::by(Direction::Desc, MemberSortKey::Username)
        );
        assert_eq!(
            Sort::parse("age").unwrap(),
            Sort::by(Direction::Asc, MemberSortKey::Age)
        );
        assert!(Sort::parse("password,asc").is_err());
        assert!(Sort::parse("age,sideways").is_err());
    }

    #[test]
    fn order_by_always_ends_with_id_tie_breaker() {
        let sort = Sort::by(Direction::Desc, MemberSortKey::Username);
        assert_eq!(sort.to_sql(), "username DESC, id ASC");
        assert_eq!(Sort::unsorted().to_sql(), "id ASC");
        assert_eq!(
            Sort::by(Direction::Desc, MemberSortKey::Id).to_sql(),
            "id DESC"
        );
    }

    #[test]
    fn page_serializes_to_envelope() {
        let page = Page::new(vec!["a", "b", "c"], &PageRequest::of(0, 3), 5);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalElements"], 5);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["number"], 0);
        assert_eq!(json["first"], true);
        assert_eq!(json["hasNext"], true);
        assert_eq!(json["content"].as_array().map(Vec::len), Some(3));
    }
}
