use std::{cell::RefCell, collections::VecDeque, error::Error, path::PathBuf, rc::Rc, time::Duration};

use crate::{
    messenger::ConstructMessenger,
    poller::{PollCondition, Poller},
};

use super::{
    ArchiveExtractor, CommandExecutor, GuestProcess, GuestSession, IaasClient, StaticVersion,
    VmConnectionValidator, VmConstruct, WinRmEnabler,
};

/// Call names recorded by every capability fake, in order.
pub(super) type CallLog = Rc<RefCell<Vec<String>>>;

fn record(calls: &CallLog, name: &str) {
    calls.borrow_mut().push(name.to_string());
}

fn outcome(error: Option<&str>) -> Result<(), Box<dyn Error>> {
    match error {
        Some(message) => Err(message.into()),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct StartCall {
    pub(super) vm_inventory_path: String,
    pub(super) username: String,
    pub(super) password: String,
    pub(super) command: String,
    pub(super) args: Vec<String>,
}

pub(super) struct FakeIaasClient {
    calls: CallLog,
    pub(super) make_directory_error: Option<&'static str>,
    /// Per upload call; calls past the end succeed.
    pub(super) upload_errors: RefCell<VecDeque<Option<&'static str>>>,
    pub(super) start_result: Result<&'static str, &'static str>,
    pub(super) wait_result: Result<i32, &'static str>,
    /// Per power state query; queries past the end report powered off.
    pub(super) power_states: RefCell<VecDeque<Result<bool, &'static str>>>,
    pub(super) directories: RefCell<Vec<String>>,
    pub(super) uploads: RefCell<Vec<(String, String, String)>>,
    pub(super) starts: RefCell<Vec<StartCall>>,
    pub(super) waits: RefCell<Vec<String>>,
}

impl FakeIaasClient {
    fn new(calls: CallLog) -> Self {
        Self {
            calls,
            make_directory_error: None,
            upload_errors: RefCell::new(VecDeque::new()),
            start_result: Ok("0"),
            wait_result: Ok(0),
            power_states: RefCell::new(VecDeque::new()),
            directories: RefCell::new(vec![]),
            uploads: RefCell::new(vec![]),
            starts: RefCell::new(vec![]),
            waits: RefCell::new(vec![]),
        }
    }
}

impl IaasClient for FakeIaasClient {
    fn make_directory(&self, session: &GuestSession, path: &str) -> Result<(), Box<dyn Error>> {
        record(&self.calls, "make_directory");
        assert_eq!(session.vm_inventory_path, "fakeVmPath");
        self.directories.borrow_mut().push(path.to_string());
        outcome(self.make_directory_error)
    }

    fn upload_artifact(
        &self,
        session: &GuestSession,
        artifact: &str,
        destination: &str,
    ) -> Result<(), Box<dyn Error>> {
        record(&self.calls, "upload_artifact");
        self.uploads.borrow_mut().push((
            session.vm_inventory_path.clone(),
            artifact.to_string(),
            destination.to_string(),
        ));
        outcome(self.upload_errors.borrow_mut().pop_front().flatten())
    }

    fn start(
        &self,
        session: &GuestSession,
        command: &str,
        args: &[&str],
    ) -> Result<GuestProcess, Box<dyn Error>> {
        record(&self.calls, "start");
        self.starts.borrow_mut().push(StartCall {
            vm_inventory_path: session.vm_inventory_path.clone(),
            username: session.username.clone(),
            password: session.password.clone(),
            command: command.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        });
        self.start_result
            .map(GuestProcess::new)
            .map_err(|message| message.into())
    }

    fn wait_for_exit(
        &self,
        _session: &GuestSession,
        process: GuestProcess,
    ) -> Result<i32, Box<dyn Error>> {
        record(&self.calls, "wait_for_exit");
        self.waits.borrow_mut().push(process.pid().to_string());
        self.wait_result.map_err(|message| message.into())
    }

    fn is_powered_off(&self, _session: &GuestSession) -> Result<bool, Box<dyn Error>> {
        record(&self.calls, "is_powered_off");
        match self.power_states.borrow_mut().pop_front() {
            Some(state) => state.map_err(|message| message.into()),
            None => Ok(true),
        }
    }
}

pub(super) struct FakeWinRmEnabler {
    calls: CallLog,
    pub(super) error: Option<&'static str>,
}

impl WinRmEnabler for FakeWinRmEnabler {
    fn enable(&self) -> Result<(), Box<dyn Error>> {
        record(&self.calls, "enable_winrm");
        outcome(self.error)
    }
}

pub(super) struct FakeConnectionValidator {
    calls: CallLog,
    pub(super) error: Option<&'static str>,
}

impl VmConnectionValidator for FakeConnectionValidator {
    fn validate(&self) -> Result<(), Box<dyn Error>> {
        record(&self.calls, "validate_connection");
        outcome(self.error)
    }
}

pub(super) struct FakeRemoteManager {
    calls: CallLog,
    pub(super) extract_error: Option<&'static str>,
    pub(super) execute_error: Option<&'static str>,
    pub(super) extractions: RefCell<Vec<(String, String)>>,
    pub(super) commands: RefCell<Vec<String>>,
}

impl ArchiveExtractor for FakeRemoteManager {
    fn extract_archive(&self, source: &str, destination: &str) -> Result<(), Box<dyn Error>> {
        record(&self.calls, "extract_archive");
        self.extractions
            .borrow_mut()
            .push((source.to_string(), destination.to_string()));
        outcome(self.extract_error)
    }
}

impl CommandExecutor for FakeRemoteManager {
    fn execute_command(&self, command: &str) -> Result<(), Box<dyn Error>> {
        record(&self.calls, "execute_command");
        self.commands.borrow_mut().push(command.to_string());
        outcome(self.execute_error)
    }
}

/// Runs the condition back to back without sleeping, unless `error` is set,
/// in which case the condition is never called.
pub(super) struct FakePoller {
    calls: CallLog,
    pub(super) error: Option<&'static str>,
    pub(super) intervals: RefCell<Vec<Duration>>,
}

impl Poller for FakePoller {
    fn poll(
        &self,
        interval: Duration,
        condition: &mut PollCondition<'_>,
    ) -> Result<(), Box<dyn Error>> {
        record(&self.calls, "poll");
        self.intervals.borrow_mut().push(interval);
        if let Some(message) = self.error {
            return Err(message.into());
        }
        while !condition()? {}
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct FakeMessenger {
    pub(super) events: RefCell<Vec<String>>,
}

impl FakeMessenger {
    fn event(&self, name: &str) {
        self.events.borrow_mut().push(name.to_string());
    }

    pub(super) fn count(&self, name: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.as_str() == name)
            .count()
    }
}

impl ConstructMessenger for FakeMessenger {
    fn create_provision_dir_started(&self) {
        self.event("create_provision_dir_started");
    }
    fn create_provision_dir_succeeded(&self) {
        self.event("create_provision_dir_succeeded");
    }
    fn upload_artifacts_started(&self) {
        self.event("upload_artifacts_started");
    }
    fn upload_artifacts_succeeded(&self) {
        self.event("upload_artifacts_succeeded");
    }
    fn upload_file_started(&self, artifact: &str) {
        self.event(&format!("upload_file_started({artifact})"));
    }
    fn upload_file_succeeded(&self) {
        self.event("upload_file_succeeded");
    }
    fn enable_winrm_started(&self) {
        self.event("enable_winrm_started");
    }
    fn enable_winrm_succeeded(&self) {
        self.event("enable_winrm_succeeded");
    }
    fn validate_vm_connection_started(&self) {
        self.event("validate_vm_connection_started");
    }
    fn validate_vm_connection_succeeded(&self) {
        self.event("validate_vm_connection_succeeded");
    }
    fn extract_artifacts_started(&self) {
        self.event("extract_artifacts_started");
    }
    fn extract_artifacts_succeeded(&self) {
        self.event("extract_artifacts_succeeded");
    }
    fn log_out_users_started(&self) {
        self.event("log_out_users_started");
    }
    fn log_out_users_succeeded(&self) {
        self.event("log_out_users_succeeded");
    }
    fn execute_script_started(&self) {
        self.event("execute_script_started");
    }
    fn execute_script_succeeded(&self) {
        self.event("execute_script_succeeded");
    }
    fn winrm_disconnected_for_reboot(&self) {
        self.event("winrm_disconnected_for_reboot");
    }
    fn restart_in_progress(&self) {
        self.event("restart_in_progress");
    }
    fn shutdown_completed(&self) {
        self.event("shutdown_completed");
    }
}

/// Every collaborator of a construct run, succeeding unless told otherwise.
pub(super) struct Fakes {
    pub(super) calls: CallLog,
    pub(super) client: FakeIaasClient,
    pub(super) winrm_enabler: FakeWinRmEnabler,
    pub(super) connection_validator: FakeConnectionValidator,
    pub(super) remote_manager: FakeRemoteManager,
    pub(super) messenger: FakeMessenger,
    pub(super) poller: FakePoller,
    pub(super) version: StaticVersion,
}

impl Fakes {
    pub(super) fn new() -> Self {
        let calls: CallLog = Rc::default();
        Self {
            client: FakeIaasClient::new(calls.clone()),
            winrm_enabler: FakeWinRmEnabler {
                calls: calls.clone(),
                error: None,
            },
            connection_validator: FakeConnectionValidator {
                calls: calls.clone(),
                error: None,
            },
            remote_manager: FakeRemoteManager {
                calls: calls.clone(),
                extract_error: None,
                execute_error: None,
                extractions: RefCell::new(vec![]),
                commands: RefCell::new(vec![]),
            },
            messenger: FakeMessenger::default(),
            poller: FakePoller {
                calls: calls.clone(),
                error: None,
                intervals: RefCell::new(vec![]),
            },
            version: StaticVersion("dev".to_string()),
            calls,
        }
    }

    pub(super) fn construct(&self) -> VmConstruct<'_> {
        VmConstruct {
            session: GuestSession {
                vm_inventory_path: "fakeVmPath".to_string(),
                username: "fakeUser".to_string(),
                password: "fakePass".to_string(),
                artifact_directory: PathBuf::from("."),
            },
            client: &self.client,
            winrm_enabler: &self.winrm_enabler,
            connection_validator: &self.connection_validator,
            extractor: &self.remote_manager,
            executor: &self.remote_manager,
            messenger: &self.messenger,
            poller: &self.poller,
            version_getter: &self.version,
        }
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub(super) fn events(&self) -> Vec<String> {
        self.messenger.events.borrow().clone()
    }
}
