use chrono::{DateTime, Utc};

use super::session::{
    CompanyModel, MerchantOrderState, MerchantOrderStatus, SessionModel, SessionModelError,
    SessionStatusModel,
};

#[derive(Debug)]
pub enum OrderModelError {
    // session is in a state that must never turn into an order
    UnacceptableSessionStatus(String),
    UnknownOrderStatus(String),
    MissingOrderStatus,
}

/// the merchant's durable order record, mirroring the provider facts
/// extracted at materialization time
#[derive(Debug, Clone)]
pub struct MerchantOrderModel {
    pub order_id: String,
    pub cart_id: String,
    pub state: MerchantOrderState,
    pub status: MerchantOrderStatus,
    pub session_id: Option<String>,
    pub psp_display_name: String,
    pub reservation_id: String,
    pub backoffice_url: String,
    pub session_status: String,
    pub company: Option<CompanyModel>,
    pub strong_auth: Option<String>,
    pub total_paid: i64,
    pub grand_total: i64,
}

impl MerchantOrderModel {
    /// convert a confirmed provider session into the order record,
    /// non-fatal extraction gaps come back as warning labels for the
    /// caller to log
    #[allow(clippy::type_complexity)]
    pub fn materialize(
        order_id: String,
        cart_id: String,
        session: &SessionModel,
        grand_total: i64,
        test_mode: bool,
    ) -> Result<(Self, Vec<String>), OrderModelError> {
        match &session.status {
            SessionStatusModel::Completed | SessionStatusModel::Pending => {}
            other => {
                return Err(OrderModelError::UnacceptableSessionStatus(
                    other.as_str().to_string(),
                ))
            }
        }
        let (state, status) = match session.order_status.as_ref() {
            None => return Err(OrderModelError::MissingOrderStatus),
            Some(s) => s.order_progress().ok_or_else(|| {
                OrderModelError::UnknownOrderStatus(format!("{:?}", s))
            })?,
        };
        let mut warnings = Vec::new();
        let (psp_display_name, reservation_id, session_status) = match session.first_transaction() {
            Some(t) => (
                t.psp_display_name.clone(),
                t.reservation_id.clone(),
                t.status.clone(),
            ),
            None => {
                warnings.push("no-transaction-in-session".to_string());
                (String::new(), String::new(), String::new())
            }
        };
        let backoffice_url = match session.merchant_id() {
            Ok(mid) => session.backoffice_url(mid.as_str(), test_mode),
            Err(e) => {
                warnings.push(format!("client-token:{:?}", e));
                String::new()
            }
        };
        let company = session.is_business().then(|| {
            session.company.clone().unwrap_or_else(|| {
                warnings.push("business-without-company-data".to_string());
                CompanyModel::default()
            })
        });
        let strong_auth = match session.strong_auth_encoded() {
            Ok(v) => v,
            Err(SessionModelError::StrongAuthIncomplete) => {
                warnings.push("strong-auth-incomplete".to_string());
                None
            }
            Err(e) => {
                warnings.push(format!("strong-auth:{:?}", e));
                None
            }
        };
        let obj = Self {
            order_id,
            cart_id,
            state,
            status,
            session_id: Some(session.session_id.clone()),
            psp_display_name,
            reservation_id,
            backoffice_url,
            session_status,
            company,
            strong_auth,
            total_paid: 0,
            grand_total,
        };
        Ok((obj, warnings))
    } // end of fn materialize

    /// returns whether anything actually changed, duplicate webhook
    /// deliveries have to stay write-free
    pub fn apply_progress(
        &mut self,
        progress: (MerchantOrderState, MerchantOrderStatus),
    ) -> bool {
        let (state, status) = progress;
        if self.state == state && self.status == status {
            false
        } else {
            self.state = state;
            self.status = status;
            true
        }
    }

    /// accumulate a captured amount, flipping the order to complete once
    /// everything has been paid
    pub fn register_payment(&mut self, amount_minor: i64) -> bool {
        self.total_paid += amount_minor;
        if self.total_paid >= self.grand_total {
            self.state = MerchantOrderState::Complete;
            self.status = MerchantOrderStatus::Complete;
            true
        } else {
            false
        }
    }
} // end of impl MerchantOrderModel

/// one merchant invoice as seen by the settlement paths
#[derive(Debug, Clone)]
pub struct InvoiceRecordModel {
    pub invoice_id: String,
    pub order_id: String,
    pub shipping_included: bool,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
}
