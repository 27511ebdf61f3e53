//! Search filters for the `/query/sims` endpoint.

use std::fmt;
use std::str::FromStr;

use super::ApiError;

/// Query parameter carrying the continuation cursor
pub const CURSOR_PARAM: &str = "lastEvaluatedKey";

/// The filter dimension of a SIM search. Exactly one is set per query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SimFilter {
    #[default]
    Name,
    Group,
    Tag,
    Status,
    SessionStatus,
    SubscriptionStatus,
}

impl SimFilter {
    pub const ALL: [SimFilter; 6] = [
        SimFilter::Name,
        SimFilter::Group,
        SimFilter::Tag,
        SimFilter::Status,
        SimFilter::SessionStatus,
        SimFilter::SubscriptionStatus,
    ];

    /// Query parameter name sent to the API
    pub fn param_key(&self) -> &'static str {
        match self {
            SimFilter::Name => "name",
            SimFilter::Group => "group",
            SimFilter::Tag => "tag",
            SimFilter::Status => "status",
            SimFilter::SessionStatus => "sessionStatus",
            SimFilter::SubscriptionStatus => "subscription",
        }
    }

    /// Name used on the command line and in the search form
    pub fn as_str(&self) -> &'static str {
        match self {
            SimFilter::SubscriptionStatus => "subscriptionStatus",
            other => other.param_key(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SimFilter::Name => "Name",
            SimFilter::Group => "Group",
            SimFilter::Tag => "Tag",
            SimFilter::Status => "Status",
            SimFilter::SessionStatus => "Session Status",
            SimFilter::SubscriptionStatus => "Subscription Status",
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SimFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SimFilter {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SimFilter::Name),
            "group" => Ok(SimFilter::Group),
            "tag" => Ok(SimFilter::Tag),
            "status" => Ok(SimFilter::Status),
            "sessionStatus" => Ok(SimFilter::SessionStatus),
            "subscriptionStatus" | "subscription" => Ok(SimFilter::SubscriptionStatus),
            other => Err(ApiError::UserError(format!("Invalid search type: {}", other))),
        }
    }
}

/// A single-filter SIM search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimQuery {
    filter: SimFilter,
    value: String,
}

impl SimQuery {
    pub fn new(filter: SimFilter, value: impl Into<String>) -> Self {
        Self {
            filter,
            value: value.into(),
        }
    }

    /// Build a query from user input, rejecting a blank value.
    pub fn try_new(filter: SimFilter, value: &str) -> Result<Self, ApiError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ApiError::UserError("Please enter a search value".to_string()));
        }
        Ok(Self::new(filter, value))
    }

    pub fn filter(&self) -> SimFilter {
        self.filter
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Request parameters for one page: the filter pair, then the cursor if any.
    pub fn params(&self, cursor: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![(self.filter.param_key(), self.value.clone())];
        if let Some(cursor) = cursor {
            params.push((CURSOR_PARAM, cursor.to_string()));
        }
        params
    }
}

impl fmt::Display for SimQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = \"{}\"", self.filter.label(), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_keys() {
        assert_eq!(SimFilter::Name.param_key(), "name");
        assert_eq!(SimFilter::Group.param_key(), "group");
        assert_eq!(SimFilter::Tag.param_key(), "tag");
        assert_eq!(SimFilter::Status.param_key(), "status");
        assert_eq!(SimFilter::SessionStatus.param_key(), "sessionStatus");
        assert_eq!(SimFilter::SubscriptionStatus.param_key(), "subscription");
    }

    #[test]
    fn test_from_str() {
        for filter in SimFilter::ALL {
            assert_eq!(filter.as_str().parse::<SimFilter>().ok(), Some(filter));
        }
        assert_eq!(
            "subscription".parse::<SimFilter>().ok(),
            Some(SimFilter::SubscriptionStatus)
        );
        assert!(matches!(
            "imsi".parse::<SimFilter>(),
            Err(ApiError::UserError(_))
        ));
    }

    #[test]
    fn test_filter_cycle() {
        assert_eq!(SimFilter::Name.next(), SimFilter::Group);
        assert_eq!(SimFilter::SubscriptionStatus.next(), SimFilter::Name); // Wraps around
        assert_eq!(SimFilter::Name.prev(), SimFilter::SubscriptionStatus); // Wraps around
        assert_eq!(SimFilter::Tag.prev(), SimFilter::Group);
    }

    #[test]
    fn test_params_single_filter() {
        let query = SimQuery::new(SimFilter::Name, "alice");
        assert_eq!(query.params(None), vec![("name", "alice".to_string())]);
    }

    #[test]
    fn test_params_with_cursor() {
        let query = SimQuery::new(SimFilter::SessionStatus, "ONLINE");
        assert_eq!(
            query.params(Some("x")),
            vec![
                ("sessionStatus", "ONLINE".to_string()),
                ("lastEvaluatedKey", "x".to_string()),
            ]
        );
    }

    #[test]
    fn test_try_new_rejects_blank() {
        assert!(matches!(
            SimQuery::try_new(SimFilter::Group, "   "),
            Err(ApiError::UserError(_))
        ));
        let query = SimQuery::try_new(SimFilter::Group, "  sensors ").expect("valid query");
        assert_eq!(query.value(), "sensors");
    }
}
