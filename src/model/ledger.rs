use chrono::{DateTime, Utc};

/// per (order, line item) record of how much of a provider capture is
/// still refundable, drained to zero but never deleted
#[derive(Debug, Clone)]
pub struct CaptureLedgerEntryModel {
    pub id: u64,
    pub invoice_id: String,
    pub order_id: String,
    pub item_id: String,
    pub capture_id: String,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundAllocationModel {
    pub entry_id: u64,
    pub capture_id: String,
    pub quantity: u32,
}

/// walk the ledger entries in creation order, consuming from each until
/// the requested quantity is exhausted, the second element of the result
/// is whatever could not be attributed to any capture
pub fn allocate_refund(
    entries: &[CaptureLedgerEntryModel],
    requested: u32,
) -> (Vec<RefundAllocationModel>, u32) {
    let mut remaining = requested;
    let mut out = Vec::new();
    for entry in entries {
        if remaining == 0 {
            break;
        }
        if entry.quantity == 0 {
            continue;
        }
        let consumed = remaining.min(entry.quantity);
        remaining -= consumed;
        out.push(RefundAllocationModel {
            entry_id: entry.id,
            capture_id: entry.capture_id.clone(),
            quantity: consumed,
        });
    }
    (out, remaining)
} // end of fn allocate_refund
