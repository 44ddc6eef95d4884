use std::boxed::Box;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::marker::{Send, Sync};
use std::result::Result as DefaultResult;
use std::sync::RwLock;

use serde_json::Value as JsnVal;

use crate::config::{AppConfidentialCfg, AppConfig};
use crate::error::{AppConfidentialityError, AppErrorCode};

// the secret source file is user-maintained, it should never grow large
const SOURCE_SIZE_LIMIT_NBYTES: u64 = 8196;

pub trait AbstractConfidentiality: Send + Sync {
    // read-only interface to fetch user-defined private data
    fn try_get_payload(&self, id_: &str) -> DefaultResult<String, AppConfidentialityError>;
}

pub fn build_context(
    cfg: &AppConfig,
) -> DefaultResult<Box<dyn AbstractConfidentiality>, AppConfidentialityError> {
    let confidential = &cfg.api_server.confidentiality;
    match confidential {
        AppConfidentialCfg::UserSpace { sys_path } => {
            let fullpath = cfg.basepath.system.clone() + sys_path;
            let obj = UserSpaceConfidentiality::build(fullpath);
            Ok(Box::new(obj))
        }
    }
}

pub struct UserSpaceConfidentiality {
    _src_fullpath: String,
    // the inner cache stays small, the only consumers so far are the SQL
    // database pool and the payment-orchestration provider client
    // TODO, add expiry
    _cached: RwLock<HashMap<String, String>>,
}

impl UserSpaceConfidentiality {
    pub fn build(fullpath: String) -> Self {
        let _cached = RwLock::new(HashMap::new());
        Self {
            _cached,
            _src_fullpath: fullpath,
        }
    }

    fn rawdata_from_source(&self) -> DefaultResult<(usize, Vec<u8>), AppConfidentialityError> {
        let srcpath = self._src_fullpath.as_str();
        let mut rawbuf = Vec::new();
        match File::open(srcpath) {
            Ok(mut file) => {
                let actual_f_sz = file.metadata().unwrap().len();
                if actual_f_sz < SOURCE_SIZE_LIMIT_NBYTES {
                    match file.read_to_end(&mut rawbuf) {
                        Ok(sz) => Ok((sz, rawbuf)),
                        Err(e) => Err(AppConfidentialityError {
                            detail: e.to_string(),
                            code: AppErrorCode::IOerror(e.kind()),
                        }),
                    }
                } else {
                    Err(AppConfidentialityError {
                        code: AppErrorCode::ExceedingMaxLimit,
                        detail: "source-file".to_string(),
                    })
                }
            }
            Err(e) => Err(AppConfidentialityError {
                code: AppErrorCode::IOerror(e.kind()),
                detail: e.to_string(),
            }),
        }
    } // end of fn rawdata_from_source

    fn to_json(&self, raw: Vec<u8>) -> DefaultResult<JsnVal, AppConfidentialityError> {
        serde_json::from_slice::<JsnVal>(&raw).map_err(|e| AppConfidentialityError {
            code: AppErrorCode::InvalidJsonFormat,
            detail: e.to_string(),
        })
    }

    fn search_json_payload<'a>(
        &self,
        toplvl: &'a JsnVal,
        id_: &str,
    ) -> DefaultResult<&'a JsnVal, AppConfidentialityError> {
        let mut curr_lvl = toplvl;
        for tok in id_.split('/') {
            let err_detail = match curr_lvl {
                JsnVal::Object(o) => match o.get(tok) {
                    Some(nxtlvl) => {
                        curr_lvl = nxtlvl;
                        None
                    }
                    None => Some(format!("json-object,id:{}", id_)),
                },
                JsnVal::Array(a) => match tok.parse::<usize>() {
                    Ok(t) => match a.get(t) {
                        Some(nxtlvl) => {
                            curr_lvl = nxtlvl;
                            None
                        }
                        None => Some(format!("json-array,id:{}", id_)),
                    },
                    Err(e) => Some(format!("path-error,id:{},detail:{}", id_, e)),
                },
                _others => Some(format!("json-scalar,id:{}", id_)),
            };
            if let Some(msg) = err_detail {
                return Err(AppConfidentialityError {
                    detail: msg,
                    code: AppErrorCode::NoConfidentialityCfg,
                });
            }
        } // end of loop
        Ok(curr_lvl)
    } // end of fn search_json_payload
} // end of impl UserSpaceConfidentiality

impl AbstractConfidentiality for UserSpaceConfidentiality {
    fn try_get_payload(&self, id_: &str) -> DefaultResult<String, AppConfidentialityError> {
        let rguard = self
            ._cached
            .read()
            .map_err(|e| AppConfidentialityError {
                detail: e.to_string() + ", source: UserSpaceConfidentiality",
                code: AppErrorCode::AcquireLockFailure,
            })?;
        if let Some(v) = rguard.get(id_) {
            Ok(v.clone())
        } else {
            drop(rguard);
            let (_sz, rawdata) = self.rawdata_from_source()?;
            let toplvl = self.to_json(rawdata)?;
            let found = self.search_json_payload(&toplvl, id_)?;
            let found = serde_json::to_string(found).unwrap();
            let mut wguard = self
                ._cached
                .write()
                .map_err(|e| AppConfidentialityError {
                    detail: e.to_string() + ", source: UserSpaceConfidentiality",
                    code: AppErrorCode::AcquireLockFailure,
                })?;
            let _old_data = wguard.insert(id_.to_string(), found.clone());
            Ok(found)
        }
    } // end of fn try_get_payload
} // end of impl AbstractConfidentiality
