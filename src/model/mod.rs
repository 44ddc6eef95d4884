mod cart;
mod contact;
mod ledger;
pub mod money;
mod order;
mod session;

pub use cart::{CartLineModel, CartLineType, CartModel, CartModelError};
pub use contact::ContactModel;
pub use ledger::{allocate_refund, CaptureLedgerEntryModel, RefundAllocationModel};
pub use money::{CurrencyContextModel, MoneyAmountError};
pub use order::{InvoiceRecordModel, MerchantOrderModel, OrderModelError};
pub use session::{
    CompanyModel, MerchantOrderState, MerchantOrderStatus, ProviderOrderStatus,
    SessionCaptureModel, SessionModel, SessionModelError, SessionStatusModel,
    SessionTransactionModel,
};
