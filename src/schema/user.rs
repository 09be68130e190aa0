use serde::{Deserialize, Deserializer, Serialize};

use super::feedback::DetailFeedback;

/// Anything that is not a number counts as absent.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|x| x.trim().parse().ok()))
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

/// Query string of a `/users` pagination link.
#[derive(Debug, Serialize)]
pub struct UserListLink<'a> {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<&'a str>,
}

impl UserListLink<'_> {
    pub fn to_query(&self) -> anyhow::Result<String> {
        Ok(serde_urlencoded::to_string(self)?)
    }
}

#[derive(Debug, Serialize)]
pub struct ListUser {
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct DetailUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_date: Option<String>,
    pub feedback: Vec<DetailFeedback>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_list_query_lenient() {
        let query: UserListQuery =
            serde_urlencoded::from_str("page=abc&page_size=5&search=al").unwrap();
        assert_eq!(query.page, None);
        assert_eq!(query.page_size, Some(5));
        assert_eq!(query.search, Some("al".to_string()));

        let query: UserListQuery = serde_urlencoded::from_str("page=-1&page_size=").unwrap();
        assert_eq!(query.page, None);
        assert_eq!(query.page_size, None);

        let query: UserListQuery = serde_urlencoded::from_str("").unwrap();
        assert_eq!(query.page, None);
    }

    #[test]
    fn test_user_list_link_query() {
        let link = UserListLink {
            page: 2,
            page_size: 10,
            search: Some("a b&c=d"),
        };
        assert_eq!(
            link.to_query().unwrap(),
            "page=2&page_size=10&search=a+b%26c%3Dd"
        );

        let link = UserListLink {
            page: 1,
            page_size: 10,
            search: None,
        };
        assert_eq!(link.to_query().unwrap(), "page=1&page_size=10");
    }
}
