use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsnVal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatusModel {
    Pending,
    Completed,
    Expired,
    Cancelled,
    Other(String),
}

impl SessionStatusModel {
    fn from_label(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            "expired" => Self::Expired,
            "cancelled" => Self::Cancelled,
            _others => Self::Other(raw.to_string()),
        }
    }
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s.as_str(),
        }
    }
    pub fn completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOrderStatus {
    Pending,
    ApprovedNotCaptured,
    CapturedFull,
    Rejected,
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MerchantOrderState {
    New,
    Processing,
    Complete,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MerchantOrderStatus {
    PendingPayment,
    Processing,
    Complete,
    Canceled,
}

impl MerchantOrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Canceled => "canceled",
        }
    }
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw {
            "new" => Some(Self::New),
            "processing" => Some(Self::Processing),
            "complete" => Some(Self::Complete),
            "canceled" => Some(Self::Canceled),
            _others => None,
        }
    }
}

impl MerchantOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Canceled => "canceled",
        }
    }
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw {
            "pending_payment" => Some(Self::PendingPayment),
            "processing" => Some(Self::Processing),
            "complete" => Some(Self::Complete),
            "canceled" => Some(Self::Canceled),
            _others => None,
        }
    }
}

impl ProviderOrderStatus {
    pub fn from_label(raw: &str) -> Self {
        match raw {
            "order_pending" => Self::Pending,
            "order_approved_not_captured" => Self::ApprovedNotCaptured,
            "captured_full" => Self::CapturedFull,
            "order_rejected" => Self::Rejected,
            _others => Self::Unknown(raw.to_string()),
        }
    }
    /// canonical status mapping, `None` means the incoming label is not
    /// recognized and no order mutation may happen
    pub fn order_progress(&self) -> Option<(MerchantOrderState, MerchantOrderStatus)> {
        match self {
            Self::Pending => Some((MerchantOrderState::New, MerchantOrderStatus::PendingPayment)),
            Self::ApprovedNotCaptured | Self::CapturedFull => {
                Some((MerchantOrderState::Processing, MerchantOrderStatus::Processing))
            }
            Self::Rejected => Some((MerchantOrderState::Canceled, MerchantOrderStatus::Canceled)),
            Self::Unknown(_) => None,
        }
    }
} // end of impl ProviderOrderStatus

#[derive(Debug, Clone)]
pub struct SessionTransactionModel {
    pub status: String,
    pub psp_display_name: String,
    pub reservation_id: String,
}

#[derive(Debug, Clone)]
pub struct SessionCaptureModel {
    pub capture_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Default)]
pub struct CompanyModel {
    pub cin: String,
    pub name: String,
    pub vat_number: String,
}

#[derive(Debug)]
pub enum SessionModelError {
    MissingClientToken,
    InvalidClientToken(String),
    MissingMerchantId,
    // strong-auth structure present but one of its mandatory keys absent
    StrongAuthIncomplete,
}

/// typed mirror of one provider session read, parsed leniently since
/// many fields only exist at specific points of the session lifecycle
#[derive(Debug, Clone)]
pub struct SessionModel {
    pub session_id: String,
    pub status: SessionStatusModel,
    pub customer_type: Option<String>,
    pub client_token: Option<String>,
    pub html_snippet: Option<String>,
    pub billing: JsnVal,
    pub shipping: JsnVal,
    pub amount_inc_vat: Option<i64>,
    // merchant order increment id previously patched into the session
    // references, read back by webhook-driven materialization
    pub reference1: Option<String>,
    pub order_status: Option<ProviderOrderStatus>,
    pub transactions: Vec<SessionTransactionModel>,
    pub captures: Vec<SessionCaptureModel>,
    pub company: Option<CompanyModel>,
    pub strong_auth: Option<JsnVal>,
}

#[derive(Deserialize)]
struct ClientTokenClaims {
    #[serde(rename = "merchantId")]
    merchant_id: Option<String>,
}

fn jsn_str(v: &JsnVal, key: &str) -> Option<String> {
    v.get(key).and_then(JsnVal::as_str).map(ToString::to_string)
}

#[rustfmt::skip]
impl SessionModel {
    pub fn parse(session_id: String, raw: &JsnVal) -> Self {
        let data = raw.get("data").cloned().unwrap_or(JsnVal::Null);
        let status = jsn_str(raw, "status")
            .map(|s| SessionStatusModel::from_label(s.as_str()))
            .unwrap_or(SessionStatusModel::Other(String::new()));
        let order_status = raw
            .pointer("/moduleStatus/payment/orderStatus")
            .and_then(JsnVal::as_str)
            .map(ProviderOrderStatus::from_label);
        let transactions = data
            .pointer("/transactions")
            .and_then(JsnVal::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|t| SessionTransactionModel {
                        status: jsn_str(t, "status").unwrap_or_default(),
                        psp_display_name: jsn_str(t, "pspDisplayName").unwrap_or_default(),
                        reservation_id: jsn_str(t, "reservationId").unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let captures = data
            .pointer("/captures")
            .and_then(JsnVal::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|c| SessionCaptureModel {
                        capture_id: jsn_str(c, "captureId").unwrap_or_default(),
                        status: jsn_str(c, "status").unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let company = data.get("company").and_then(JsnVal::as_object).map(|c| {
            CompanyModel {
                cin: c.get("cin").and_then(JsnVal::as_str).unwrap_or("").to_string(),
                name: c.get("name").and_then(JsnVal::as_str).unwrap_or("").to_string(),
                vat_number: c.get("vatNumber").and_then(JsnVal::as_str).unwrap_or("").to_string(),
            }
        });
        Self {
            session_id,
            status,
            customer_type: jsn_str(raw, "customerType"),
            client_token: jsn_str(raw, "clientToken"),
            html_snippet: jsn_str(raw, "htmlSnippet"),
            billing: raw.get("billing").cloned().unwrap_or(JsnVal::Null),
            shipping: raw.get("shipping").cloned().unwrap_or(JsnVal::Null),
            amount_inc_vat: data.pointer("/order/amountIncVat").and_then(JsnVal::as_i64),
            reference1: raw
                .pointer("/references/reference1")
                .and_then(JsnVal::as_str)
                .map(ToString::to_string),
            order_status,
            transactions,
            captures,
            company,
            strong_auth: data.get("strongAuth").cloned(),
        }
    } // end of fn parse

    pub fn first_transaction(&self) -> Option<&SessionTransactionModel> {
        self.transactions.first()
    }

    pub fn find_capture(&self, capture_id: &str) -> Option<&SessionCaptureModel> {
        self.captures.iter().find(|c| c.capture_id == capture_id)
    }

    pub fn is_business(&self) -> bool {
        self.customer_type.as_deref() == Some("business")
    }

    /// the token comes straight out of a provider call the merchant
    /// itself just made over an authenticated channel, its signature
    /// is deliberately not verified here, only the claims are read
    pub fn merchant_id(&self) -> Result<String, SessionModelError> {
        let token = self
            .client_token
            .as_deref()
            .ok_or(SessionModelError::MissingClientToken)?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        let decoded = jsonwebtoken::decode::<ClientTokenClaims>(
            token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .map_err(|e| SessionModelError::InvalidClientToken(e.to_string()))?;
        decoded
            .claims
            .merchant_id
            .ok_or(SessionModelError::MissingMerchantId)
    } // end of fn merchant_id

    pub fn backoffice_url(&self, merchant_id: &str, test_mode: bool) -> String {
        format!(
            "https://app.briqpay.com/dashboard/sessions/orders/{}?test={}&merchantId={}",
            self.session_id,
            if test_mode { 1 } else { 0 },
            merchant_id,
        )
    }

    /// both `output` and `provider` have to be present, the whole
    /// structure is then stored base64-encoded as one opaque blob
    pub fn strong_auth_encoded(&self) -> Result<Option<String>, SessionModelError> {
        let sauth = match self.strong_auth.as_ref() {
            Some(v) if v.is_object() => v,
            _others => return Ok(None),
        };
        if sauth.get("output").is_none() || sauth.get("provider").is_none() {
            return Err(SessionModelError::StrongAuthIncomplete);
        }
        let serialized = serde_json::to_string(sauth)
            .map_err(|e| SessionModelError::InvalidClientToken(e.to_string()))?;
        Ok(Some(b64.encode(serialized)))
    }

    /// the snippet lands in a page whose scripts are already loaded,
    /// inline script tags from the provider have to be dropped
    pub fn sanitized_html_snippet(&self) -> Option<String> {
        self.html_snippet.as_ref().map(|raw| {
            match Regex::new(r"(?is)<script\b[^>]*>.*?</script>") {
                Ok(re) => re.replace_all(raw.as_str(), "").into_owned(),
                Err(_e) => raw.clone(),
            }
        })
    }
} // end of impl SessionModel
