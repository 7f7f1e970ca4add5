//! Test Data Generator
//!
//! Fixture users and profiles for scenarios. A caller-supplied suffix makes a
//! user fully deterministic; without one, a random nine-character suffix keeps
//! concurrently created accounts from colliding.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Password that satisfies the application's strength rule
pub const DEFAULT_PASSWORD: &str = "TestPassword123!";

/// Length of a generated suffix
pub const SUFFIX_LEN: usize = 9;

/// Credentials and names for one test account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestUser {
    /// Login email
    pub email: String,
    /// Login password
    pub password: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
}

/// A complete profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    /// Free-text bio
    pub bio: String,
    /// Age in years; not validated here
    pub age: u32,
    /// City
    pub city: String,
    /// Occupation
    pub occupation: String,
    /// Interests, in display order
    pub interests: Vec<String>,
}

/// Partial profile edit; only `Some` fields are touched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// Free-text bio
    pub bio: Option<String>,
    /// Age in years, passed through unvalidated
    pub age: Option<String>,
    /// City
    pub city: Option<String>,
    /// Occupation
    pub occupation: Option<String>,
    /// Interests
    pub interests: Option<Vec<String>>,
}

impl ProfileUpdate {
    /// Empty update
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bio
    #[must_use]
    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    /// Set age; any text, so invalid ages can be submitted
    #[must_use]
    pub fn age(mut self, age: impl ToString) -> Self {
        self.age = Some(age.to_string());
        self
    }

    /// Set city
    #[must_use]
    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Set occupation
    #[must_use]
    pub fn occupation(mut self, occupation: impl Into<String>) -> Self {
        self.occupation = Some(occupation.into());
        self
    }

    /// Set interests
    #[must_use]
    pub fn interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = Some(interests.into_iter().map(Into::into).collect());
        self
    }

    /// Whether no field is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bio.is_none()
            && self.age.is_none()
            && self.city.is_none()
            && self.occupation.is_none()
            && self.interests.is_none()
    }
}

impl From<ProfileData> for ProfileUpdate {
    fn from(profile: ProfileData) -> Self {
        Self {
            bio: Some(profile.bio),
            age: Some(profile.age.to_string()),
            city: Some(profile.city),
            occupation: Some(profile.occupation),
            interests: Some(profile.interests),
        }
    }
}

/// Nine lowercase alphanumerics from a v4 UUID
#[must_use]
pub fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..SUFFIX_LEN].to_string()
}

/// Generate a test user.
///
/// With a suffix the result is a pure function of it. Without one, the email
/// gets a random suffix and the names carry none.
#[must_use]
pub fn generate_user(suffix: Option<&str>) -> TestUser {
    let (email_suffix, name_suffix) = match suffix {
        Some(s) => (s.to_string(), s),
        None => (random_suffix(), ""),
    };
    TestUser {
        email: format!("test{email_suffix}@example.com"),
        password: DEFAULT_PASSWORD.to_string(),
        first_name: format!("TestUser{name_suffix}"),
        last_name: format!("LastName{name_suffix}"),
    }
}

/// The fixed sample profile
#[must_use]
pub fn generate_profile() -> ProfileData {
    ProfileData {
        bio: "I love traveling, good food, and meeting new people!".to_string(),
        age: 25,
        city: "San Francisco".to_string(),
        occupation: "Software Engineer".to_string(),
        interests: ["Travel", "Food", "Technology", "Fitness"]
            .into_iter()
            .map(String::from)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    mod user_tests {
        use super::*;

        #[test]
        fn test_deterministic_with_suffix() {
            let a = generate_user(Some("42"));
            let b = generate_user(Some("42"));
            assert_eq!(a, b);
            assert_eq!(a.email, "test42@example.com");
            assert_eq!(a.password, "TestPassword123!");
            assert_eq!(a.first_name, "TestUser42");
            assert_eq!(a.last_name, "LastName42");
        }

        #[test]
        fn test_random_suffix_shape() {
            let user = generate_user(None);
            let suffix = user
                .email
                .strip_prefix("test")
                .and_then(|s| s.strip_suffix("@example.com"))
                .unwrap();
            assert_eq!(suffix.len(), SUFFIX_LEN);
            assert!(suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
            assert_eq!(user.first_name, "TestUser");
            assert_eq!(user.last_name, "LastName");
        }

        #[test]
        fn test_random_users_distinct() {
            let emails: HashSet<String> = (0..1_000).map(|_| generate_user(None).email).collect();
            assert_eq!(emails.len(), 1_000);
        }
    }

    mod profile_tests {
        use super::*;

        #[test]
        fn test_fixed_profile() {
            let profile = generate_profile();
            assert_eq!(profile.age, 25);
            assert_eq!(profile.city, "San Francisco");
            assert_eq!(profile.occupation, "Software Engineer");
            assert_eq!(profile.interests, ["Travel", "Food", "Technology", "Fitness"]);
            assert_eq!(profile, generate_profile());
        }

        #[test]
        fn test_update_from_profile_sets_everything() {
            let update = ProfileUpdate::from(generate_profile());
            assert_eq!(update.age.as_deref(), Some("25"));
            assert!(update.interests.is_some());
            assert!(!update.is_empty());
        }

        #[test]
        fn test_partial_update() {
            let update = ProfileUpdate::new().bio("hi").age(150);
            assert_eq!(update.age.as_deref(), Some("150"));
            assert!(update.city.is_none());
            assert!(ProfileUpdate::new().is_empty());
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_suffix_fully_determines_user(suffix in "[a-z0-9]{1,16}") {
                let a = generate_user(Some(&suffix));
                prop_assert_eq!(&a, &generate_user(Some(&suffix)));
                prop_assert_eq!(a.email, format!("test{suffix}@example.com"));
            }
        }
    }
}
