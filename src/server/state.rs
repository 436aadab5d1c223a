use std::sync::{Arc, RwLock};

use crate::alert::{Mailer, SmtpMailer};
use crate::dictionary::MedicineDictionary;
use crate::ocr::{Recognizer, Tesseract};
use crate::settings::Settings;

/// Mail transport plus the address alerts are sent from.
#[derive(Clone)]
pub(crate) struct AlertSender {
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) from: String,
}

pub struct ServerState {
    pub(crate) settings: Settings,
    pub(crate) recognizer: Arc<dyn Recognizer>,
    pub(crate) alert_sender: Option<AlertSender>,
    dictionary: RwLock<Arc<MedicineDictionary>>,
}

impl ServerState {
    pub fn new(
        settings: Settings,
        dictionary: MedicineDictionary,
        recognizer: Arc<dyn Recognizer>,
    ) -> Self {
        Self {
            settings,
            recognizer,
            alert_sender: None,
            dictionary: RwLock::new(Arc::new(dictionary)),
        }
    }

    /// Loads the dictionary and wires tesseract and SMTP from `settings`.
    pub fn from_settings(settings: Settings) -> Self {
        let dictionary = MedicineDictionary::load(&settings.medicines_path);
        let recognizer = Arc::new(Tesseract::from_settings(&settings));
        let alert_sender = SmtpMailer::from_settings(&settings).map(|mailer| AlertSender {
            from: mailer.user().to_string(),
            mailer: Arc::new(mailer),
        });
        let mut state = Self::new(settings, dictionary, recognizer);
        state.alert_sender = alert_sender;
        state
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        self.alert_sender = Some(AlertSender {
            mailer,
            from: from.into(),
        });
        self
    }

    /// Snapshot of the current dictionary; a concurrent reload does not
    /// affect a request that already holds one.
    pub fn dictionary(&self) -> Arc<MedicineDictionary> {
        let guard = self
            .dictionary
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone()
    }

    pub(crate) fn replace_dictionary(&self, dictionary: MedicineDictionary) -> usize {
        let count = dictionary.len();
        let mut guard = self
            .dictionary
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(dictionary);
        count
    }
}
