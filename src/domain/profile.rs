use serde::{Deserialize, Serialize};

/// A registered customer with their loyalty balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub points_balance: u64,
    pub saved_address: Option<String>,
}

impl Profile {
    pub fn contact(&self) -> ContactDetails {
        ContactDetails {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Identity fields shown to the admin for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Sign-up payload.
#[derive(Debug, Clone)]
pub struct ProfileCreate {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl ProfileCreate {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}

/// Payload for editing contact details.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// `local@domain.tld` with no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// 7 to 15 ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    (7..=15).contains(&phone.len()) && phone.chars().all(|c| c.is_ascii_digit())
}
