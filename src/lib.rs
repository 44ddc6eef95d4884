pub mod adapter;
pub mod api;
pub mod confidentiality;
pub mod config;
pub mod constant;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod model;
pub mod network;
pub mod usecase;

use std::boxed::Box;
use std::result::Result;
use std::sync::Arc;

use crate::adapter::datastore::{AppDStoreError, AppDataStoreContext};
use crate::adapter::processor::{
    app_processor_context, AbstractPaymentOrchestrator, AppProcessorError,
};
use crate::config::{AppCheckoutCfg, AppConfig};
use crate::confidentiality::AbstractConfidentiality;
use crate::hooks::AppHookRegistry;
use crate::logging::AppLogContext;

pub type AppLogAlias = String;
pub type WebApiPath = String;

pub mod hard_limit {
    pub const MAX_DB_CONNECTIONS: u32 = 1800u32;
    pub const MAX_SECONDS_DB_IDLE: u16 = 360u16;
}

#[derive(Debug)]
pub enum ShrStateInitProgress {
    DataStore,
    ExternalProcessor,
}

#[derive(Debug)]
pub struct ShrStateInitError {
    pub progress: ShrStateInitProgress,
}
impl From<AppDStoreError> for ShrStateInitError {
    fn from(_value: AppDStoreError) -> Self {
        Self {
            progress: ShrStateInitProgress::DataStore,
        }
    }
}
impl From<AppProcessorError> for ShrStateInitError {
    fn from(_value: AppProcessorError) -> Self {
        Self {
            progress: ShrStateInitProgress::ExternalProcessor,
        }
    }
}

#[derive(Clone)]
pub struct AppSharedState {
    _config: Arc<AppConfig>,
    _log_ctx: Arc<AppLogContext>,
    _dstore: Arc<AppDataStoreContext>,
    _processors: Arc<Box<dyn AbstractPaymentOrchestrator>>,
    _hooks: Arc<AppHookRegistry>,
}

impl AppSharedState {
    pub fn new(
        cfg: AppConfig,
        logctx: AppLogContext,
        cfdntl: Box<dyn AbstractConfidentiality>,
        hooks: AppHookRegistry,
    ) -> Result<Self, ShrStateInitError> {
        let logctx = Arc::new(logctx);
        let cfdntl = Arc::new(cfdntl);
        let dstore = AppDataStoreContext::new(
            cfg.api_server.data_store.as_slice(),
            cfdntl.clone(),
            logctx.clone(),
        )?;
        let processors = app_processor_context(
            &cfg.api_server.third_parties,
            cfg.api_server.checkout.platform_tag.as_str(),
            cfdntl.clone(),
            logctx.clone(),
        )?;
        Ok(Self {
            _config: Arc::new(cfg),
            _log_ctx: logctx,
            _dstore: Arc::new(dstore),
            _processors: Arc::new(processors),
            _hooks: Arc::new(hooks),
        })
    } // end of fn new

    pub fn config(&self) -> Arc<AppConfig> {
        self._config.clone()
    }
    pub fn checkout_config(&self) -> AppCheckoutCfg {
        self._config.api_server.checkout.clone()
    }
    pub fn log_context(&self) -> Arc<AppLogContext> {
        self._log_ctx.clone()
    }
    pub fn datastore(&self) -> Arc<AppDataStoreContext> {
        self._dstore.clone()
    }
    pub fn processor_context(&self) -> Arc<Box<dyn AbstractPaymentOrchestrator>> {
        self._processors.clone()
    }
    pub fn hooks(&self) -> Arc<AppHookRegistry> {
        self._hooks.clone()
    }
} // end of impl AppSharedState
