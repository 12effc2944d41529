/// Custom actions for Profile rows.
///
/// Every balance change goes through one of these so that reads and writes of
/// the balance happen inside the profile actor.
#[derive(Debug, Clone)]
pub enum ProfileAction {
    SetBalance(u64),
    /// Adds earned points.
    Credit(u64),
    /// Spends points, clamping the balance at zero.
    Debit(u64),
    /// Saves (trimmed) or clears the delivery address.
    ///
    /// # Errors
    /// Saving a blank address is rejected.
    SetSavedAddress(Option<String>),
}

#[derive(Debug, Clone)]
pub enum ProfileActionResult {
    Balance(u64),
    SavedAddress(Option<String>),
}
