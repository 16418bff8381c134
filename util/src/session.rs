//! Run sessions and asynchronous data saving
//!
//! Every execution of one of the software's executables runs under a session,
//! a timestamped directory under the software root which collects the log
//! file and any data products saved during the run. Saving is asynchronous, a
//! background thread owned by the session writes queued items out as JSON.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use erased_serde::Serialize;
use log::{info, warn};
use std::{
    ffi::OsStr,
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();
static SAVE_SENDER: OnceCell<Mutex<Sender<SaveItem>>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// chrono strftime format used for session directory and file timestamps.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Sleep between polls of the save queue when it is empty.
const SAVE_THREAD_IDLE_SLEEP: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle to the running session.
#[derive(Clone)]
pub struct Session {
    /// Directory collecting everything this session produces
    pub session_root: PathBuf,

    /// Where the logger should write this session's log
    pub log_file_path: PathBuf,

    save_sender: Sender<SaveItem>,

    save_stop: Arc<AtomicBool>,
}

/// An item queued for the save thread: the session-relative path to write and
/// the data to write into it.
type SaveItem = (PathBuf, Box<dyn Serialize + Send>);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when starting a session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (ARM_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Could not create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error(
        "The session epoch is already set, only one session may exist per \
         process (conquer_once error: {0})"
    )]
    CannotInitEpoch(conquer_once::TryInitError),

    #[error("The session epoch is not set, create the Session first")]
    CannotGetEpoch,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start the process's session.
    ///
    /// Creates the directory `{sessions_dir}/{exec_name}_{timestamp}` under
    /// the software root and starts the save thread. Only one session can be
    /// created per process.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        // Set the session epoch. This fails if a session already exists in
        // this process.
        SESSION_EPOCH
            .try_init_once(Utc::now)
            .map_err(SessionError::CannotInitEpoch)?;

        let epoch = SESSION_EPOCH.get().ok_or(SessionError::CannotGetEpoch)?;

        // Create the session directory under the software root
        let mut session_root = crate::host::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;
        session_root.push(sessions_dir);
        session_root.push(format!("{}_{}", exec_name, epoch.format(TIMESTAMP_FORMAT)));

        fs::create_dir_all(&session_root).map_err(SessionError::CannotCreateDir)?;

        let log_file_path = session_root.join(format!("{}.log", exec_name));

        // Create the save channel, keeping a copy of the sender in the static
        // so that free functions can queue saves too
        let (tx, rx) = channel();
        SAVE_SENDER.init_once(|| Mutex::new(tx.clone()));

        // Spawn the save thread
        let save_stop = Arc::new(AtomicBool::new(false));
        let stop = save_stop.clone();
        let root = session_root.clone();
        thread::spawn(move || save_thread(stop, root, rx));

        Ok(Session {
            session_root,
            log_file_path,
            save_sender: tx,
            save_stop,
        })
    }

    /// End the session, blocking until the save thread has written out
    /// everything still queued.
    pub fn exit(self) {
        self.save_stop.store(true, Ordering::Relaxed);

        info!("Waiting for the save thread to drain");

        // The save thread clears the stop flag once it has drained the queue
        while self.save_stop.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(1));
        }

        info!("Save thread done");
    }

    /// Queue `data` to be written to the session-relative `path` by the save
    /// thread.
    pub fn save<P: AsRef<Path>, T: Serialize + Send + 'static>(&self, path: P, data: T) {
        if let Err(e) = self
            .save_sender
            .send((path.as_ref().to_path_buf(), Box::new(data)))
        {
            warn!("Could not queue {:?} for saving: {}", path.as_ref(), e)
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Seconds elapsed since the session started.
///
/// Panics if no session has been created in this process yet.
pub fn get_elapsed_seconds() -> f64 {
    let epoch = get_epoch();
    let elapsed = Utc::now() - *epoch;

    time::duration_to_seconds(elapsed).unwrap_or(std::f64::NAN)
}

/// The instant the session started at.
///
/// Panics if no session has been created in this process yet.
pub fn get_epoch() -> &'static DateTime<Utc> {
    match SESSION_EPOCH.get() {
        Some(e) => e,
        None => panic!("No session epoch, create the Session first"),
    }
}

/// Queue `data` for saving without a `Session` handle.
///
/// Does nothing except warn when no session exists yet.
pub fn save<P: AsRef<Path>, T: Serialize + Send + 'static>(path: P, data: T) {
    let sender = match SAVE_SENDER.get() {
        Some(s) => s,
        None => {
            warn!("Save requested before any session exists, ignoring");
            return;
        }
    };

    let sender = match sender.lock() {
        Ok(s) => s,
        Err(_) => {
            warn!("Couldn't get lock on save sender");
            return;
        }
    };

    if let Err(e) = sender.send((path.as_ref().to_path_buf(), Box::new(data))) {
        warn!(
            "Couldn't send data to save thread for file {:?}: {}",
            path.as_ref(),
            e
        );
    }
}

/// Like [`save`] but with a timestamp appended to the file name, so repeated
/// saves to the same path accumulate instead of overwriting.
pub fn save_with_timestamp<P: AsRef<Path>, T: Serialize + Send + 'static>(path: P, data: T) {
    let stem = path.as_ref().file_stem().unwrap_or(OsStr::new(""));

    let mut file_name = stem.to_os_string();
    file_name.push("_");
    file_name.push(Utc::now().format(TIMESTAMP_FORMAT).to_string());

    if let Some(ext) = path.as_ref().extension() {
        file_name.push(".");
        file_name.push(ext);
    }

    let path = path.as_ref().with_file_name(file_name);

    save(path, data);
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn save_thread(stop: Arc<AtomicBool>, session_root: PathBuf, receiver: Receiver<SaveItem>) {
    loop {
        match receiver.try_recv() {
            Ok((path, data)) => {
                let full_path = session_root.join(path);
                if let Err(e) = save_item(&full_path, data.as_ref()) {
                    warn!("Couldn't save {:?}: {}", full_path, e);
                }
            }
            Err(_) => {
                // No data pending. If exit has been requested clear the stop
                // flag to signal the queue is drained and end the thread.
                if stop.load(Ordering::Relaxed) {
                    stop.store(false, Ordering::Relaxed);
                    break;
                }

                thread::sleep(SAVE_THREAD_IDLE_SLEEP);
            }
        }
    }
}

/// Write a single queued item to disk. The output format is chosen from the
/// path's extension, currently only JSON is supported.
fn save_item(full_path: &Path, data: &(dyn Serialize + Send)) -> Result<(), String> {
    match full_path.extension().and_then(OsStr::to_str) {
        Some("json") => (),
        ext => return Err(format!("unrecognised file path extension (got {:?})", ext)),
    }

    let parent = full_path
        .parent()
        .ok_or_else(|| String::from("couldn't find parent directory"))?;

    fs::create_dir_all(parent).map_err(|e| format!("couldn't create parent directory: {}", e))?;

    let file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(full_path)
        .map_err(|e| format!("couldn't create file: {}", e))?;

    serde_json::to_writer_pretty(&file, data).map_err(|e| format!("couldn't serialise data: {}", e))
}
