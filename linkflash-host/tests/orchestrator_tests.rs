//! Flash sequence scenarios against mock and real backends

use std::fs;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use linkflash_core::{CodecError, ConfigDocument, FailureKind, Field, FlashState, Form, Outcome};
use linkflash_host::{
    CommandOutput, CommandRunner, Commands, ConfigStore, FileStore, FlashError, Orchestrator,
    ProcessRunner, RunnerError, Step, StoreError, Tone, Trigger, WorkerEvent,
};

const HEADER: &str = "\
/* Radio bridge settings */\r
#define WIFI_DEFAULT_CHANNEL    6           /* 2.4GHz channel 1-14 */\r
#define CUSTOM_BSSID            {0x01, 0x02, 0x03, 0x04, 0x05, 0x06}\r
#define WIFI_TX_RATE            PHY_RATE_1M_L  /* 1 Mbps for max range */\r
#define UART_BAUD_RATE          460800\r
#define MAX_PACKET_SIZE         256\r
#define LED_PIN                 2\r
";

#[derive(Default)]
struct MemStore {
    saves: Mutex<Vec<String>>,
}

impl ConfigStore for MemStore {
    fn load(&self) -> Result<ConfigDocument, StoreError> {
        Ok(ConfigDocument::new(HEADER))
    }

    fn save(&self, doc: &ConfigDocument) -> Result<(), StoreError> {
        self.saves.lock().unwrap().push(doc.as_str().to_string());
        Ok(())
    }
}

/// Records every step; build and flash exit with the scripted codes
struct ScriptedRunner {
    build_code: i32,
    flash_code: i32,
    /// Build cannot be started at all
    build_missing: bool,
    calls: Mutex<Vec<Step>>,
    /// Build blocks until released when set
    gate: Option<Mutex<Receiver<()>>>,
}

impl ScriptedRunner {
    fn new(build_code: i32) -> Self {
        Self {
            build_code,
            flash_code: 0,
            build_missing: false,
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    fn failing_flash(flash_code: i32) -> Self {
        Self {
            flash_code,
            ..Self::new(0)
        }
    }

    fn missing_build() -> Self {
        Self {
            build_missing: true,
            ..Self::new(0)
        }
    }

    fn gated() -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let runner = Self {
            gate: Some(Mutex::new(rx)),
            ..Self::new(0)
        };
        (runner, tx)
    }

    fn calls(&self) -> Vec<Step> {
        self.calls.lock().unwrap().clone()
    }
}

fn exited(code: i32, tool: &str, lines: usize) -> CommandOutput {
    CommandOutput {
        success: code == 0,
        code: Some(code),
        output: (1..=lines).map(|i| format!("{tool} line {i}\n")).collect(),
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, step: &Step) -> Result<CommandOutput, RunnerError> {
        self.calls.lock().unwrap().push(step.clone());
        match step {
            Step::Clean => Ok(exited(0, "make", 0)),
            Step::Build => {
                if self.build_missing {
                    return Err(RunnerError::Spawn {
                        program: "make".into(),
                        source: io::Error::new(io::ErrorKind::NotFound, "not found"),
                    });
                }
                if let Some(gate) = &self.gate {
                    gate.lock().unwrap().recv().unwrap();
                }
                Ok(exited(self.build_code, "make", 15))
            }
            Step::Flash { .. } => Ok(exited(self.flash_code, "esptool", 12)),
        }
    }
}

fn log_lines(events: &[WorkerEvent]) -> Vec<(String, Tone)> {
    events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::Log(line) => Some((line.text.clone(), line.tone)),
            WorkerEvent::Progress(_) => None,
        })
        .collect()
}

#[test]
fn test_loaded_link_id_is_colon_hex() {
    let doc = MemStore::default().load().unwrap();
    let form = Form::from_document(&doc);
    assert_eq!(form.get(Field::Channel), "6");
    assert_eq!(form.get(Field::LinkId), "01:02:03:04:05:06");
}

#[test]
fn test_build_failure_skips_flash() {
    let runner = Arc::new(ScriptedRunner::new(2));
    let store = Arc::new(MemStore::default());
    let mut orch = Orchestrator::new(store.clone(), runner.clone(), 10);

    let mut doc = ConfigDocument::new(HEADER);
    let form = Form::from_document(&doc);
    let trigger = orch.request_flash(Some("/dev/ttyUSB0"), &form, &mut doc);
    assert_eq!(trigger.unwrap(), Trigger::Started);

    let events = orch.wait();
    assert!(events.contains(&WorkerEvent::Progress(
        linkflash_core::FlashEvent::Failed(FailureKind::ExternalCommand)
    )));

    // Clean and build ran; flash never did
    assert_eq!(runner.calls(), vec![Step::Clean, Step::Build]);
    assert_eq!(
        orch.last_outcome(),
        Some(Outcome::Failure(FailureKind::ExternalCommand))
    );
    assert_eq!(orch.status(), "Flash failed");
    assert_eq!(orch.state(), FlashState::Idle);

    let lines = log_lines(&events);
    let failed_at = lines
        .iter()
        .position(|(text, _)| text == "BUILD FAILED:")
        .unwrap();
    let tail = &lines[failed_at + 1..];
    assert_eq!(tail.len(), 10);
    assert_eq!(tail[0], ("  make line 6".to_string(), Tone::Error));
    assert_eq!(tail[9].0, "  make line 15");

    // The header was still written before the build
    assert_eq!(store.saves.lock().unwrap().len(), 1);
}

#[test]
fn test_flash_failure_reports_tail() {
    let runner = Arc::new(ScriptedRunner::failing_flash(1));
    let mut orch = Orchestrator::new(Arc::new(MemStore::default()), runner.clone(), 10);

    let mut doc = ConfigDocument::new(HEADER);
    let form = Form::from_document(&doc);
    orch.request_flash(Some("/dev/ttyUSB0"), &form, &mut doc).unwrap();
    let events = orch.wait();

    assert_eq!(runner.calls().len(), 3);
    assert_eq!(
        orch.last_outcome(),
        Some(Outcome::Failure(FailureKind::ExternalCommand))
    );
    assert_eq!(orch.status(), "Flash failed");

    let lines = log_lines(&events);
    let texts: Vec<&str> = lines.iter().map(|(text, _)| text.as_str()).collect();
    assert!(texts.contains(&"Build OK"));
    assert!(!texts.contains(&"Flash complete!"));

    let failed_at = texts.iter().position(|t| *t == "FLASH FAILED:").unwrap();
    assert_eq!(texts[failed_at - 1], "Flashing /dev/ttyUSB0...");
    let tail = &lines[failed_at + 1..];
    assert_eq!(tail.len(), 10);
    assert_eq!(tail[0], ("  esptool line 3".to_string(), Tone::Error));
    assert_eq!(tail[9].0, "  esptool line 12");
}

#[test]
fn test_unstartable_build_is_unexpected() {
    let runner = Arc::new(ScriptedRunner::missing_build());
    let mut orch = Orchestrator::new(Arc::new(MemStore::default()), runner.clone(), 10);

    let mut doc = ConfigDocument::new(HEADER);
    let form = Form::from_document(&doc);
    orch.request_flash(Some("/dev/ttyUSB0"), &form, &mut doc).unwrap();
    let events = orch.wait();

    assert_eq!(runner.calls(), vec![Step::Clean, Step::Build]);
    assert_eq!(
        orch.last_outcome(),
        Some(Outcome::Failure(FailureKind::Unexpected))
    );
    assert!(log_lines(&events).contains(&(
        "ERROR: failed to run make: not found".to_string(),
        Tone::Error
    )));
}

#[test]
fn test_double_trigger_runs_one_sequence() {
    let (runner, release) = ScriptedRunner::gated();
    let runner = Arc::new(runner);
    let store = Arc::new(MemStore::default());
    let mut orch = Orchestrator::new(store.clone(), runner.clone(), 10);

    let mut doc = ConfigDocument::new(HEADER);
    let form = Form::from_document(&doc);

    let first = orch.request_flash(Some("/dev/ttyACM0"), &form, &mut doc);
    assert_eq!(first.unwrap(), Trigger::Started);
    assert!(orch.is_busy());
    assert!(orch.state().is_busy());

    let second = orch.request_flash(Some("/dev/ttyACM0"), &form, &mut doc);
    assert_eq!(second.unwrap(), Trigger::Ignored);

    // Polling mid-sequence does not finish it
    let _ = orch.poll();
    assert!(orch.is_busy());

    release.send(()).unwrap();
    orch.wait();

    assert_eq!(
        runner.calls(),
        vec![
            Step::Clean,
            Step::Build,
            Step::Flash {
                port: "/dev/ttyACM0".into()
            },
        ]
    );
    assert_eq!(store.saves.lock().unwrap().len(), 1);
    assert_eq!(orch.last_outcome(), Some(Outcome::Success));

    // The trigger is enabled again; release the next build up front
    release.send(()).unwrap();
    let again = orch.request_flash(Some("/dev/ttyACM0"), &form, &mut doc);
    assert_eq!(again.unwrap(), Trigger::Started);
    orch.wait();
}

#[test]
fn test_unwritable_header_is_file_access_failure() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path().join("missing").join("user_config.h")));
    let runner = Arc::new(ScriptedRunner::new(0));
    let mut orch = Orchestrator::new(store, runner.clone(), 10);

    let mut doc = ConfigDocument::new(HEADER);
    let form = Form::from_document(&doc);
    orch.request_flash(Some("/dev/ttyUSB0"), &form, &mut doc).unwrap();
    let events = orch.wait();

    assert!(runner.calls().is_empty());
    assert_eq!(
        orch.last_outcome(),
        Some(Outcome::Failure(FailureKind::FileAccess))
    );
    let lines = log_lines(&events);
    assert!(lines
        .iter()
        .any(|(text, tone)| text.starts_with("ERROR: cannot write ") && *tone == Tone::Error));
}

#[test]
fn test_missing_define_blocks_start() {
    let mut orch = Orchestrator::new(
        Arc::new(MemStore::default()),
        Arc::new(ScriptedRunner::new(0)),
        10,
    );
    let text = "#define WIFI_DEFAULT_CHANNEL 6\n";
    let mut doc = ConfigDocument::new(text);
    let mut form = Form::from_document(&doc);
    form.set(Field::BaudRate, "460800");
    form.set(Field::PacketSize, "64");

    let err = orch
        .request_flash(Some("/dev/ttyUSB0"), &form, &mut doc)
        .unwrap_err();
    assert!(err.is_gate());
    assert!(matches!(
        err,
        FlashError::Codec(CodecError::Missing(Field::LinkId))
    ));
    assert_eq!(doc.as_str(), text);
    assert!(!orch.is_busy());
}

#[test]
fn test_end_to_end_with_processes() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    let header = dir.join("user_config.h");
    fs::write(&header, HEADER).unwrap();

    let sh = |script: &str| vec!["sh".to_string(), "-c".to_string(), script.to_string()];
    let commands = Commands {
        clean: sh("exit 1"),
        build: sh("grep -q 'WIFI_DEFAULT_CHANNEL    11' user_config.h"),
        flash: sh("echo {port} > flashed.txt"),
    };

    let store = Arc::new(FileStore::new(&header));
    let mut doc = store.load().unwrap();
    let mut form = Form::from_document(&doc);
    form.set(Field::Channel, "11");

    let mut orch = Orchestrator::new(store, Arc::new(ProcessRunner::new(commands, dir)), 10);
    orch.request_flash(Some("/dev/ttyUSB3"), &form, &mut doc).unwrap();
    orch.wait();

    assert_eq!(orch.last_outcome(), Some(Outcome::Success));
    assert_eq!(
        fs::read_to_string(dir.join("flashed.txt")).unwrap().trim(),
        "/dev/ttyUSB3"
    );

    let written = fs::read_to_string(&header).unwrap();
    assert_eq!(written, HEADER.replace("CHANNEL    6 ", "CHANNEL    11 "));
    assert!(written.contains("#define LED_PIN                 2\r\n"));
}
