//! Customer entities.

use chrono::{DateTime, Utc};
use common::CustomerId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A customer of the store. Email is optional but unique when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Builds a new customer from validated input.
    pub fn create(new: NewCustomer) -> Result<Self, DomainError> {
        new.validate()?;
        Ok(Self {
            id: CustomerId::new(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            address: new.address,
            created_at: Utc::now(),
        })
    }

    /// Applies a partial update.
    pub fn apply(&mut self, patch: CustomerPatch) -> Result<(), DomainError> {
        patch.validate()?;
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = Some(email);
        }
        if let Some(phone) = patch.phone {
            self.phone = Some(phone);
        }
        if let Some(address) = patch.address {
            self.address = Some(address);
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    // Deliberately loose: the storage unique constraint is the real guard,
    // this only catches obvious typos.
    let valid = email.split_once('@').is_some_and(|(local, host)| {
        !local.is_empty() && host.contains('.') && !host.starts_with('.')
    });
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidEmail {
            email: email.to_string(),
        })
    }
}

/// Input for creating a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl NewCustomer {
    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingName { field: "Customer" });
        }
        if let Some(ref email) = self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Partial update for a customer; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerPatch {
    fn validate(&self) -> Result<(), DomainError> {
        if let Some(ref name) = self.name
            && name.trim().is_empty()
        {
            return Err(DomainError::MissingName { field: "Customer" });
        }
        if let Some(ref email) = self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_customer() -> NewCustomer {
        NewCustomer {
            name: "Alice".to_string(),
            email: Some("alice@example.com".to_string()),
            phone: None,
            address: None,
        }
    }

    #[test]
    fn create_valid_customer() {
        let customer = Customer::create(new_customer()).unwrap();
        assert_eq!(customer.name, "Alice");
        assert_eq!(customer.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn create_without_email_is_fine() {
        let mut new = new_customer();
        new.email = None;
        assert!(Customer::create(new).is_ok());
    }

    #[test]
    fn create_rejects_bad_email() {
        for bad in ["no-at-sign", "@example.com", "alice@nodot", "alice@.com"] {
            let mut new = new_customer();
            new.email = Some(bad.to_string());
            assert!(Customer::create(new).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn apply_keeps_unset_fields() {
        let mut customer = Customer::create(new_customer()).unwrap();
        customer
            .apply(CustomerPatch {
                phone: Some("555-0101".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(customer.phone.as_deref(), Some("555-0101"));
        assert_eq!(customer.email.as_deref(), Some("alice@example.com"));
    }
}
