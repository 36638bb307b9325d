pub mod server;

use crate::gatehouse::config::GateConfig;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        gate: GateConfig,
    },
}
