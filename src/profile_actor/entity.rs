use crate::actor_framework::Entity;
use crate::domain::{is_valid_email, is_valid_phone, Profile, ProfileCreate, ProfilePatch};
use crate::ledger;
use super::actions::{ProfileAction, ProfileActionResult};

fn validate_contact(name: &str, email: &str, phone: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name is required".to_string());
    }
    if !is_valid_email(email) {
        return Err(format!("invalid email address: {email}"));
    }
    if !is_valid_phone(phone) {
        return Err(format!("invalid phone number: {phone}"));
    }
    Ok(())
}

impl Entity for Profile {
    type Id = String;
    type CreatePayload = ProfileCreate;
    type Patch = ProfilePatch;
    type Action = ProfileAction;
    type ActionResult = ProfileActionResult;

    fn id(&self) -> &String { &self.id }

    /// Signs up a customer with a zero balance and no saved address.
    fn from_create(id: String, params: ProfileCreate) -> Result<Self, String> {
        validate_contact(&params.name, &params.email, &params.phone)?;
        Ok(Self {
            id,
            name: params.name.trim().to_string(),
            email: params.email.trim().to_string(),
            phone: params.phone.trim().to_string(),
            points_balance: 0,
            saved_address: None,
        })
    }

    fn on_update(&mut self, patch: ProfilePatch) -> Result<(), String> {
        let name = patch.name.unwrap_or_else(|| self.name.clone());
        let email = patch.email.unwrap_or_else(|| self.email.clone());
        let phone = patch.phone.unwrap_or_else(|| self.phone.clone());
        validate_contact(&name, &email, &phone)?;
        self.name = name.trim().to_string();
        self.email = email.trim().to_string();
        self.phone = phone.trim().to_string();
        Ok(())
    }

    fn handle_action(&mut self, action: ProfileAction) -> Result<ProfileActionResult, String> {
        match action {
            ProfileAction::SetBalance(balance) => {
                self.points_balance = balance;
                Ok(ProfileActionResult::Balance(self.points_balance))
            }
            ProfileAction::Credit(amount) => {
                self.points_balance = ledger::credit(self.points_balance, amount);
                Ok(ProfileActionResult::Balance(self.points_balance))
            }
            ProfileAction::Debit(amount) => {
                self.points_balance = ledger::debit(self.points_balance, amount);
                Ok(ProfileActionResult::Balance(self.points_balance))
            }
            ProfileAction::SetSavedAddress(Some(address)) => {
                let address = address.trim();
                if address.is_empty() {
                    return Err("saved address must not be blank".to_string());
                }
                self.saved_address = Some(address.to_string());
                Ok(ProfileActionResult::SavedAddress(self.saved_address.clone()))
            }
            ProfileAction::SetSavedAddress(None) => {
                self.saved_address = None;
                Ok(ProfileActionResult::SavedAddress(None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Profile {
        Profile::from_create("user_1".into(), ProfileCreate::new("Alice", "alice@example.com", "9876543210")).unwrap()
    }

    #[test]
    fn sign_up_validates_contact_details() {
        assert!(Profile::from_create("u".into(), ProfileCreate::new("", "a@b.co", "1234567")).is_err());
        assert!(Profile::from_create("u".into(), ProfileCreate::new("A", "nope", "1234567")).is_err());
        assert!(Profile::from_create("u".into(), ProfileCreate::new("A", "a@b.co", "12ab567")).is_err());

        let profile = alice();
        assert_eq!(profile.points_balance, 0);
        assert_eq!(profile.saved_address, None);
    }

    #[test]
    fn debit_clamps_balance_to_zero() {
        let mut profile = alice();
        profile.handle_action(ProfileAction::Credit(25)).unwrap();
        match profile.handle_action(ProfileAction::Debit(40)).unwrap() {
            ProfileActionResult::Balance(balance) => assert_eq!(balance, 0),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(profile.points_balance, 0);
    }

    #[test]
    fn saved_address_is_trimmed_and_clearable() {
        let mut profile = alice();
        profile.handle_action(ProfileAction::SetSavedAddress(Some("  12 MG Road ".into()))).unwrap();
        assert_eq!(profile.saved_address.as_deref(), Some("12 MG Road"));

        assert!(profile.handle_action(ProfileAction::SetSavedAddress(Some("   ".into()))).is_err());

        profile.handle_action(ProfileAction::SetSavedAddress(None)).unwrap();
        assert_eq!(profile.saved_address, None);
    }

    #[test]
    fn patch_keeps_unspecified_fields() {
        let mut profile = alice();
        profile
            .on_update(ProfilePatch { phone: Some("9123456780".into()), ..Default::default() })
            .unwrap();
        assert_eq!(profile.phone, "9123456780");
        assert_eq!(profile.name, "Alice");
        assert!(profile.on_update(ProfilePatch { email: Some("bad".into()), ..Default::default() }).is_err());
    }
}
