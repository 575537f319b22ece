//! Test doubles shared by the front-end tests

use std::sync::{Arc, Mutex};

use linkflash_core::ConfigDocument;
use linkflash_host::{
    CommandOutput, CommandRunner, ConfigStore, Orchestrator, RunnerError, Step, StoreError,
};

pub const DOC: &str = "\
#define WIFI_DEFAULT_CHANNEL    6
#define CUSTOM_BSSID            {0x01, 0x02, 0x03, 0x04, 0x05, 0x06}
#define WIFI_TX_RATE            PHY_RATE_1M_L
#define UART_BAUD_RATE          460800
#define MAX_PACKET_SIZE         256
";

/// Store keeping every saved document in memory
#[derive(Default)]
pub struct MemStore {
    pub saved: Mutex<Vec<String>>,
}

impl ConfigStore for MemStore {
    fn load(&self) -> Result<ConfigDocument, StoreError> {
        Ok(ConfigDocument::new(DOC))
    }

    fn save(&self, doc: &ConfigDocument) -> Result<(), StoreError> {
        self.saved.lock().unwrap().push(doc.as_str().to_string());
        Ok(())
    }
}

/// Runner where every step succeeds
pub struct OkRunner;

impl CommandRunner for OkRunner {
    fn run(&self, _step: &Step) -> Result<CommandOutput, RunnerError> {
        Ok(CommandOutput {
            success: true,
            code: Some(0),
            output: String::new(),
        })
    }
}

pub fn orchestrator(store: Arc<MemStore>) -> Orchestrator {
    Orchestrator::new(store, Arc::new(OkRunner), 10)
}
