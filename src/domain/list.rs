use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::error::DomainError;

/// The two canonical collections every user owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListKind {
    Watchlist,
    Favourites,
}

impl ListKind {
    pub const ALL: [ListKind; 2] = [ListKind::Watchlist, ListKind::Favourites];

    /// Name stored in the `lists.name` column.
    pub fn name(&self) -> &'static str {
        match self {
            ListKind::Watchlist => "Watchlist",
            ListKind::Favourites => "Favourites",
        }
    }

    /// Route of the page displaying this list.
    pub fn path(&self) -> &'static str {
        match self {
            ListKind::Watchlist => "/watchlist",
            ListKind::Favourites => "/favourites",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ListKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Watchlist" => Ok(ListKind::Watchlist),
            "Favourites" => Ok(ListKind::Favourites),
            other => Err(DomainError::Validation(format!("Unknown list: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Tv,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Tv => "tv",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "movie" => Ok(ContentType::Movie),
            "tv" => Ok(ContentType::Tv),
            other => Err(DomainError::Validation(format!(
                "Unknown content type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserList {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: ListKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: i64,
    pub list_id: Uuid,
    pub content_id: i64,
    pub content_type: ContentType,
    pub title: String,
    pub poster_path: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// A content reference about to be placed in a list.
#[derive(Debug, Clone)]
pub struct NewListItem {
    pub content_id: i64,
    pub content_type: ContentType,
    pub title: String,
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ItemOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_kind_names_round_trip_through_from_str() {
        for kind in ListKind::ALL {
            assert_eq!(kind.name().parse::<ListKind>().unwrap(), kind);
        }
        assert!("Wishlist".parse::<ListKind>().is_err());
    }

    #[test]
    fn test_content_type_parses_wire_values() {
        assert_eq!("movie".parse::<ContentType>().unwrap(), ContentType::Movie);
        assert_eq!(" tv ".parse::<ContentType>().unwrap(), ContentType::Tv);
        assert!(matches!(
            "series".parse::<ContentType>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_content_type_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ContentType::Tv).unwrap(), "tv");
    }
}
