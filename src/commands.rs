//! Command handlers - the entry points a user interface calls.
//!
//! Each handler validates its input locally, issues at most one store or identity call,
//! and reports the outcome through [`Presenter::notify`]. Failures are logged and returned
//! to the caller; nothing is retried. Handlers never touch the in-memory lists: the sync
//! engine is the only writer, so a failed command cannot leave local state inconsistent.

use crate::auth::{IdentityProvider, MIN_PASSWORD_LENGTH, Principal};
use crate::core::validation::{CollectionForm, EmiForm};
use crate::errors::{AuthFlow, Error, Result};
use crate::presentation::{Presenter, Severity};
use crate::session::Session;
use crate::store::{EmiPatch, EmiRecord, RecordId, RecordKind, RecordStore};
use crate::sync::{Clock, LiveSync, local_today};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Raw sign-up input.
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    /// Display name
    pub name: String,
    /// Sign-in email
    pub email: String,
    /// Chosen password
    pub password: String,
    /// Password typed a second time
    pub confirm_password: String,
}

/// A running session and the task applying its snapshots.
struct ActiveSession {
    session: Arc<Session>,
    sync_task: JoinHandle<()>,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.sync_task.abort();
    }
}

/// Application facade holding the store, identity provider, presenter and current session.
pub struct App {
    store: Arc<dyn RecordStore>,
    identity: Arc<dyn IdentityProvider>,
    presenter: Arc<dyn Presenter>,
    active: Option<ActiveSession>,
    clock: Clock,
}

impl App {
    /// Creates a signed-out application.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        identity: Arc<dyn IdentityProvider>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            store,
            identity,
            presenter,
            active: None,
            clock: local_today,
        }
    }

    /// Replaces the clock used for paid dates and monthly figures.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The current session, if signed in.
    #[must_use]
    pub fn session(&self) -> Option<Arc<Session>> {
        self.active.as_ref().map(|active| Arc::clone(&active.session))
    }

    fn require_session(&self) -> Result<Arc<Session>> {
        self.session().ok_or(Error::AuthenticationRequired)
    }

    /// Like [`Self::require_session`], but tells the user when there is none.
    fn session_or_report(&self) -> Result<Arc<Session>> {
        self.require_session().inspect_err(|err| self.report_failure(err, ""))
    }

    /// Logs and surfaces a failed command. Validation errors show their own message.
    fn report_failure(&self, err: &Error, failure_message: &str) {
        match err {
            Error::Validation { message } => {
                debug!("Rejected input: {}", message);
                self.presenter.notify(message, Severity::Error);
            }
            Error::AuthenticationRequired => {
                warn!("Command attempted without a session");
                self.presenter.notify("Please sign in first", Severity::Error);
            }
            _ => {
                error!("{}: {}", failure_message, err);
                self.presenter.notify(failure_message, Severity::Error);
            }
        }
    }

    fn surface<T>(
        &self,
        result: Result<T>,
        success: (&str, Severity),
        failure_message: &str,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                self.presenter.notify(success.0, success.1);
                Ok(value)
            }
            Err(err) => {
                self.report_failure(&err, failure_message);
                Err(err)
            }
        }
    }

    async fn start_session(&mut self, principal: Principal) -> Result<()> {
        self.end_session();

        let session = Arc::new(Session::new(principal));
        let sync = LiveSync::attach(
            self.store.as_ref(),
            Arc::clone(&session),
            Arc::clone(&self.presenter),
        )
        .await?
        .with_clock(self.clock);

        info!(user = %session.principal().display_label(), "Session started");
        self.active = Some(ActiveSession {
            session,
            sync_task: tokio::spawn(sync.run()),
        });
        Ok(())
    }

    fn end_session(&mut self) {
        if let Some(active) = self.active.take() {
            info!(uid = %active.session.owner(), "Session ended");
        }
    }

    /// Signs in and starts a session.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Principal> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            let err = Error::validation("Please enter both email and password");
            self.report_failure(&err, "");
            return Err(err);
        }

        let principal = match self.identity.sign_in(email, password).await {
            Ok(principal) => principal,
            Err(auth) => {
                error!("Login error: {}", auth);
                self.presenter
                    .notify(&auth.user_message(AuthFlow::SignIn), Severity::Error);
                return Err(auth.into());
            }
        };

        if let Err(err) = self.start_session(principal.clone()).await {
            self.report_failure(&err, "Failed to load your data");
            return Err(err);
        }
        Ok(principal)
    }

    /// Creates an account, signs it in and starts a session.
    #[instrument(skip_all)]
    pub async fn sign_up(&mut self, form: &SignUpForm) -> Result<Principal> {
        let name = form.name.trim();
        let email = form.email.trim();

        let invalid = if name.is_empty()
            || email.is_empty()
            || form.password.is_empty()
            || form.confirm_password.is_empty()
        {
            Some("Please fill in all fields")
        } else if form.password.chars().count() < MIN_PASSWORD_LENGTH {
            Some("Password must be at least 6 characters long")
        } else if form.password != form.confirm_password {
            Some("Passwords do not match")
        } else {
            None
        };
        if let Some(message) = invalid {
            let err = Error::validation(message);
            self.report_failure(&err, "");
            return Err(err);
        }

        let principal = match self.identity.sign_up(name, email, &form.password).await {
            Ok(principal) => principal,
            Err(auth) => {
                error!("Signup error: {}", auth);
                self.presenter
                    .notify(&auth.user_message(AuthFlow::SignUp), Severity::Error);
                return Err(auth.into());
            }
        };

        if let Err(err) = self.start_session(principal.clone()).await {
            self.report_failure(&err, "Failed to load your data");
            return Err(err);
        }
        self.presenter
            .notify("Account created successfully!", Severity::Success);
        Ok(principal)
    }

    /// Starts a session for a principal the identity provider already holds.
    pub async fn resume(&mut self) -> Result<Option<Principal>> {
        let Some(principal) = self.identity.current_principal().await else {
            debug!("No principal to resume");
            return Ok(None);
        };
        if let Err(err) = self.start_session(principal.clone()).await {
            self.report_failure(&err, "Failed to load your data");
            return Err(err);
        }
        Ok(Some(principal))
    }

    /// Ends the session and signs out of the identity provider.
    pub async fn sign_out(&mut self) -> Result<()> {
        self.end_session();
        let result = self.identity.sign_out().await.map_err(Error::from);
        self.surface(
            result,
            ("Logged out successfully", Severity::Info),
            "Logout failed",
        )
    }

    /// Validates and stores a new collection.
    #[instrument(skip(self))]
    pub async fn add_collection(&self, form: &CollectionForm) -> Result<RecordId> {
        let result: Result<RecordId> = async {
            let session = self.require_session()?;
            let new = form.validate()?;
            self.store.create_collection(session.owner(), new).await
        }
        .await;
        self.surface(
            result,
            ("Collection added successfully", Severity::Success),
            "Failed to add collection",
        )
    }

    /// Deletes a collection.
    #[instrument(skip(self))]
    pub async fn delete_collection(&self, id: RecordId) -> Result<()> {
        let result: Result<()> = async {
            let session = self.require_session()?;
            self.store
                .delete(session.owner(), RecordKind::Collection, id)
                .await
        }
        .await;
        self.surface(
            result,
            ("Collection deleted", Severity::Info),
            "Failed to delete collection",
        )
    }

    /// Validates and stores a new EMI.
    #[instrument(skip(self))]
    pub async fn add_emi(&self, form: &EmiForm) -> Result<RecordId> {
        let result: Result<RecordId> = async {
            let session = self.require_session()?;
            let new = form.validate()?;
            self.store.create_emi(session.owner(), new).await
        }
        .await;
        self.surface(
            result,
            ("EMI added successfully", Severity::Success),
            "Failed to add EMI",
        )
    }

    /// Deletes an EMI.
    #[instrument(skip(self))]
    pub async fn delete_emi(&self, id: RecordId) -> Result<()> {
        let result: Result<()> = async {
            let session = self.require_session()?;
            self.store.delete(session.owner(), RecordKind::Emi, id).await
        }
        .await;
        self.surface(result, ("EMI deleted", Severity::Info), "Failed to delete EMI")
    }

    /// Selects an EMI for payment confirmation and returns it for display.
    ///
    /// An id missing from the current list selects nothing.
    pub async fn begin_payment(&self, id: RecordId) -> Result<Option<EmiRecord>> {
        let session = self.session_or_report()?;
        let Some(emi) = session.find_emi(id).await else {
            debug!(id, "No such EMI in the current list");
            return Ok(None);
        };
        session.set_pending_payment(Some(id)).await;
        Ok(Some(emi))
    }

    /// Abandons the pending payment confirmation.
    pub async fn cancel_payment(&self) -> Result<()> {
        let session = self.session_or_report()?;
        session.set_pending_payment(None).await;
        Ok(())
    }

    /// Marks the pending EMI paid today.
    ///
    /// Returns `false` when nothing was pending. The pending id is cleared only on success.
    #[instrument(skip(self))]
    pub async fn confirm_payment(&self) -> Result<bool> {
        let session = self.session_or_report()?;
        let Some(id) = session.pending_payment().await else {
            debug!("No payment pending confirmation");
            return Ok(false);
        };

        let result = self
            .store
            .update_emi(session.owner(), id, EmiPatch::paid_on((self.clock)()))
            .await;
        if result.is_ok() {
            session.set_pending_payment(None).await;
        }
        self.surface(
            result,
            ("EMI marked as paid", Severity::Success),
            "Failed to update EMI status",
        )
        .map(|()| true)
    }
}
