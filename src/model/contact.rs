use serde_json::Value as JsnVal;

use crate::api::web::dto::{AddressDto, CheckoutCartDto};

// snapshot fields the provider fills in on its own, a mismatch on any
// of these never means the buyer changed their data mid-checkout
const COMPARE_IGNORED_KEYS: [&str; 4] = ["country", "companyName", "cin", "region"];

/// normalized billing / shipping contact, every field defaults to an
/// empty string rather than null
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactModel {
    pub street_address: String,
    pub street_address2: String,
    pub zip: String,
    pub city: String,
    pub region: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

impl ContactModel {
    /// email resolution walks the chain: address record, cart-level
    /// customer email, registered-account email, then the caller
    /// fallback carried for guest flows
    pub fn resolve(addr: Option<&AddressDto>, cart: &CheckoutCartDto, fallback: Option<&str>) -> Self {
        let pick = |v: Option<&String>| v.cloned().unwrap_or_default();
        let email = addr
            .and_then(|a| a.email.clone())
            .filter(|e| !e.is_empty())
            .or_else(|| cart.customer_email.clone().filter(|e| !e.is_empty()))
            .or_else(|| cart.registered_email.clone().filter(|e| !e.is_empty()))
            .or_else(|| fallback.map(ToString::to_string))
            .unwrap_or_default();
        match addr {
            Some(a) => Self {
                street_address: pick(a.street.first()),
                street_address2: pick(a.street.get(1)),
                zip: a.zip.clone().unwrap_or_default(),
                city: a.city.clone().unwrap_or_default(),
                region: a.region.clone().unwrap_or_default(),
                first_name: a.first_name.clone().unwrap_or_default(),
                last_name: a.last_name.clone().unwrap_or_default(),
                email,
                phone_number: a.phone_number.clone().unwrap_or_default(),
            },
            None => Self {
                email,
                ..Self::default()
            },
        }
    } // end of fn resolve

    /// fields that resolved empty, for data-quality warnings, the second
    /// street line is legitimately optional and never reported
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let candidates = [
            ("streetAddress", self.street_address.as_str()),
            ("zip", self.zip.as_str()),
            ("city", self.city.as_str()),
            ("region", self.region.as_str()),
            ("firstName", self.first_name.as_str()),
            ("lastName", self.last_name.as_str()),
            ("email", self.email.as_str()),
            ("phoneNumber", self.phone_number.as_str()),
        ];
        candidates
            .into_iter()
            .filter_map(|(label, v)| v.is_empty().then_some(label))
            .collect()
    }

    fn wire_pairs(&self) -> [(&'static str, &str); 9] {
        [
            ("streetAddress", self.street_address.as_str()),
            ("streetAddress2", self.street_address2.as_str()),
            ("zip", self.zip.as_str()),
            ("city", self.city.as_str()),
            ("region", self.region.as_str()),
            ("firstName", self.first_name.as_str()),
            ("lastName", self.last_name.as_str()),
            ("email", self.email.as_str()),
            ("phoneNumber", self.phone_number.as_str()),
        ]
    }

    pub fn to_wire(&self) -> JsnVal {
        let mut obj = serde_json::Map::new();
        for (k, v) in self.wire_pairs() {
            obj.insert(k.to_string(), JsnVal::String(v.to_string()));
        }
        JsnVal::Object(obj)
    }

    /// order-insensitive comparison against the session's own snapshot,
    /// keys missing on either side are padded as null instead of being
    /// counted as a difference
    pub fn matches_snapshot(&self, snapshot: &JsnVal) -> bool {
        fn normalize(v: Option<&JsnVal>) -> &str {
            match v {
                Some(JsnVal::String(s)) => s.as_str(),
                _ => "",
            }
        }
        let empty = serde_json::Map::new();
        let remote = snapshot.as_object().unwrap_or(&empty);
        let local = self.wire_pairs();
        let mut all_keys: Vec<&str> = local.iter().map(|(k, _)| *k).collect();
        for k in remote.keys() {
            if !all_keys.contains(&k.as_str()) {
                all_keys.push(k.as_str());
            }
        }
        all_keys.into_iter().all(|key| {
            if COMPARE_IGNORED_KEYS.contains(&key) {
                return true;
            }
            let mine = local
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .unwrap_or("");
            mine == normalize(remote.get(key))
        })
    } // end of fn matches_snapshot
} // end of impl ContactModel
