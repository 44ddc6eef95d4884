use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::env;

use actix_web::rt;

use checkout_payment::api::web::AppRouteTable;
use checkout_payment::config::{AppCfgHardLimit, AppCfgInitArgs, AppConfig};
use checkout_payment::confidentiality;
use checkout_payment::constant::env_vars::EXPECTED_LABELS;
use checkout_payment::hooks::AppHookRegistry;
use checkout_payment::logging::{app_log_event, AppLogContext, AppLogLevel};
use checkout_payment::network::{app_web_service, net_server_listener};
use checkout_payment::{hard_limit, AppSharedState};

fn start_server(shr_state: AppSharedState) {
    let cfg = shr_state.config();
    let log_ctx = shr_state.log_context();
    let listener = &cfg.api_server.listen;
    let cfg_routes = listener
        .routes
        .iter()
        .map(|r| (r.path.clone(), r.handler.clone()))
        .collect::<Vec<_>>();
    let api_ver = listener.api_version.clone();
    let shr_state_cpy = shr_state.clone();
    /*
     * an `App` instance is created on each server worker thread, data
     * shared between all of them has to be initialized outside the
     * factory closure then cloned into it
     *
     * https://docs.rs/actix-web/latest/actix_web/struct.App.html#shared-mutable-state
     * */
    let app_init = move || {
        let route_table = AppRouteTable::get(api_ver.as_str());
        let (app, _num_applied) =
            app_web_service(route_table, cfg_routes.clone(), shr_state_cpy.clone());
        app
    };
    {
        // detect broken route config before the server forks workers
        let route_table = AppRouteTable::get(listener.api_version.as_str());
        let probe_routes = listener
            .routes
            .iter()
            .filter(|r| route_table.entries.contains_key(r.handler.as_str()))
            .count();
        if probe_routes == 0 {
            app_log_event!(
                log_ctx,
                AppLogLevel::ERROR,
                "no route created, web API server failed to start"
            );
            return;
        }
    }
    let ht_srv = net_server_listener(app_init, listener.host.as_str(), listener.port)
        .workers(cfg.api_server.num_workers as usize);
    app_log_event!(
        log_ctx,
        AppLogLevel::INFO,
        "web API server starting, {}:{}",
        listener.host,
        listener.port
    );
    let runner = rt::System::new();
    let _result = runner.block_on(ht_srv.run());
    app_log_event!(log_ctx, AppLogLevel::WARNING, "API server terminating");
} // end of fn start_server

fn main() {
    let iter = env::vars().filter(|(k, _v)| EXPECTED_LABELS.contains(&k.as_str()));
    let env_var_map: HashMap<String, String, RandomState> = HashMap::from_iter(iter);
    let args = AppCfgInitArgs {
        env_var_map,
        limit: AppCfgHardLimit {
            num_db_conns: hard_limit::MAX_DB_CONNECTIONS,
            seconds_db_idle: hard_limit::MAX_SECONDS_DB_IDLE,
        },
    };
    let cfg = match AppConfig::new(args) {
        Ok(v) => v,
        Err(e) => {
            println!("app failed to configure, error: {:?}", e);
            return;
        }
    };
    let confidential = match confidentiality::build_context(&cfg) {
        Ok(v) => v,
        Err(e) => {
            println!(
                "app failed to init confidentiality handler, error: {:?}",
                e
            );
            return;
        }
    };
    let log_ctx = AppLogContext::new(&cfg.basepath, &cfg.api_server.logging);
    // merchant-specific payload mutators and decision vetoes would be
    // registered here at composition time
    let hooks = AppHookRegistry::default();
    match AppSharedState::new(cfg, log_ctx, confidential, hooks) {
        Ok(shr_state) => start_server(shr_state),
        Err(e) => {
            println!("app failed to build shared state, progress: {:?}", e.progress);
        }
    }
} // end of main
