use super::fsm::{WorkflowEvent, WorkflowState, WorkflowStateMachine};
use crate::{
    Error, Result,
    client::ScoringClient,
    codec,
    config::FormConfig,
    model::{PredictionResult, TransactionForm, TransactionInput, UserId},
    normalize::{self, NormalizedBatch, UserIdPolicy},
    schema,
    session::{BatchSession, ScoredBatch},
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

/// What a call to `submit` amounted to when it did not fail.
#[derive(Debug, Clone)]
pub enum Submission<T> {
    Completed(T),
    /// Another submission was already outstanding; nothing was sent.
    Ignored,
    /// The workflow was abandoned while this submission was in flight.
    Superseded,
}

/// Terminal outcome held until acknowledged.
#[derive(Debug, Clone)]
pub enum WorkflowOutcome<T> {
    Succeeded(T),
    Failed(Error),
}

struct Slot<I, O> {
    fsm: WorkflowStateMachine,
    input: Option<I>,
    outcome: Option<WorkflowOutcome<O>>,
    generation: u64,
}

/// Shared state of one workflow instance. The lock is never held across an await.
struct WorkflowCell<I, O> {
    inner: Mutex<Slot<I, O>>,
}

impl<I, O: Clone> WorkflowCell<I, O> {
    fn new(name: &'static str) -> Self {
        Self {
            inner: Mutex::new(Slot {
                fsm: WorkflowStateMachine::new(name),
                input: None,
                outcome: None,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<I, O>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn state(&self) -> WorkflowState {
        self.lock().fsm.current_state()
    }

    fn is_busy(&self) -> bool {
        self.lock().fsm.is_busy()
    }

    fn outcome(&self) -> Option<WorkflowOutcome<O>> {
        self.lock().outcome.clone()
    }

    fn collect(&self, input: I) -> Result<()> {
        let mut slot = self.lock();
        if slot.fsm.is_terminal() {
            slot.fsm.transition(WorkflowEvent::Acknowledged)?;
            slot.outcome = None;
        }
        slot.fsm.transition(WorkflowEvent::InputReceived)?;
        slot.input = Some(input);
        Ok(())
    }

    /// `None` when a submission is already outstanding.
    fn begin(&self) -> Result<Option<(I, u64)>> {
        let mut slot = self.lock();
        if slot.fsm.is_busy() {
            debug!("Submission already in progress, ignoring");
            return Ok(None);
        }
        slot.fsm.transition(WorkflowEvent::SubmitRequested)?;
        let input = slot
            .input
            .take()
            .ok_or_else(|| Error::internal("collecting state without input"))?;
        slot.generation += 1;
        Ok(Some((input, slot.generation)))
    }

    /// Applies `event` unless the run was superseded; returns whether it applied.
    fn advance(&self, generation: u64, event: WorkflowEvent) -> Result<bool> {
        let mut slot = self.lock();
        if slot.generation != generation {
            return Ok(false);
        }
        slot.fsm.transition(event)?;
        Ok(true)
    }

    fn fail(&self, generation: u64, event: WorkflowEvent, error: Error) -> Result<Submission<O>> {
        let mut slot = self.lock();
        if slot.generation != generation {
            debug!("Discarding late failure of abandoned submission: {}", error);
            return Ok(Submission::Superseded);
        }
        slot.fsm.transition(event)?;
        error!("Submission failed ({:?}): {}", error.kind(), error);
        slot.outcome = Some(WorkflowOutcome::Failed(error.clone()));
        Err(error)
    }

    /// `commit` runs under the lock, only for the current run.
    fn succeed(&self, generation: u64, commit: impl FnOnce() -> O) -> Result<Submission<O>> {
        let mut slot = self.lock();
        if slot.generation != generation {
            debug!("Discarding late result of abandoned submission");
            return Ok(Submission::Superseded);
        }
        slot.fsm.transition(WorkflowEvent::ScoringSucceeded)?;
        let value = commit();
        slot.outcome = Some(WorkflowOutcome::Succeeded(value.clone()));
        Ok(Submission::Completed(value))
    }

    fn acknowledge(&self) -> Result<()> {
        let mut slot = self.lock();
        slot.fsm.transition(WorkflowEvent::Acknowledged)?;
        slot.outcome = None;
        Ok(())
    }

    fn abandon(&self) -> Result<()> {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.fsm.transition(WorkflowEvent::Abandoned)?;
        slot.input = None;
        slot.outcome = None;
        Ok(())
    }
}

/// Single-transaction workflow: form fields in, one scored result out.
pub struct SingleWorkflow {
    client: Arc<dyn ScoringClient>,
    user_id_policy: UserIdPolicy,
    cell: WorkflowCell<TransactionForm, PredictionResult>,
}

impl SingleWorkflow {
    pub fn new(client: Arc<dyn ScoringClient>, form: &FormConfig) -> Self {
        let user_id_policy = match UserId::parse(&form.default_user_id) {
            Some(placeholder) => UserIdPolicy::Placeholder(placeholder),
            None => UserIdPolicy::PassThrough,
        };
        Self {
            client,
            user_id_policy,
            cell: WorkflowCell::new("single"),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.cell.state()
    }

    pub fn is_in_progress(&self) -> bool {
        self.cell.is_busy()
    }

    pub fn outcome(&self) -> Option<WorkflowOutcome<PredictionResult>> {
        self.cell.outcome()
    }

    pub fn collect(&self, form: TransactionForm) -> Result<()> {
        self.cell.collect(form)
    }

    pub async fn submit(&self) -> Result<Submission<PredictionResult>> {
        let Some((form, generation)) = self.cell.begin()? else {
            return Ok(Submission::Ignored);
        };

        let input = match self.prepare(form) {
            Ok(input) => input,
            Err(e) => return self.cell.fail(generation, WorkflowEvent::ValidationFailed, e),
        };

        if !self.cell.advance(generation, WorkflowEvent::ValidationPassed)? {
            return Ok(Submission::Superseded);
        }

        match self.client.score_one(&input).await {
            Ok(result) => {
                info!(
                    "Transaction scored: {} ({})",
                    result.verdict(),
                    result.probability_percent()
                );
                self.cell.succeed(generation, || result)
            }
            Err(e) => self.cell.fail(generation, WorkflowEvent::ScoringFailed, e),
        }
    }

    pub fn acknowledge(&self) -> Result<()> {
        self.cell.acknowledge()
    }

    pub fn abandon(&self) -> Result<()> {
        self.cell.abandon()
    }

    fn prepare(&self, form: TransactionForm) -> Result<TransactionInput> {
        let record = form.into_record();
        schema::validate_record(&record)?;
        normalize::normalize(&record, &self.user_id_policy)
    }
}

struct PreparedBatch {
    batch: NormalizedBatch,
    vacuous_rows: usize,
}

/// Batch workflow: uploaded file in, scored batch stored in the session.
pub struct BatchWorkflow {
    client: Arc<dyn ScoringClient>,
    session: BatchSession,
    cell: WorkflowCell<Vec<u8>, Arc<ScoredBatch>>,
}

impl BatchWorkflow {
    pub fn new(client: Arc<dyn ScoringClient>, session: BatchSession) -> Self {
        Self {
            client,
            session,
            cell: WorkflowCell::new("batch"),
        }
    }

    pub fn session(&self) -> &BatchSession {
        &self.session
    }

    pub fn state(&self) -> WorkflowState {
        self.cell.state()
    }

    pub fn is_in_progress(&self) -> bool {
        self.cell.is_busy()
    }

    pub fn outcome(&self) -> Option<WorkflowOutcome<Arc<ScoredBatch>>> {
        self.cell.outcome()
    }

    /// Takes the raw bytes of the uploaded file; decoding happens on submit.
    pub fn collect(&self, file: Vec<u8>) -> Result<()> {
        self.cell.collect(file)
    }

    pub async fn submit(&self) -> Result<Submission<Arc<ScoredBatch>>> {
        let Some((file, generation)) = self.cell.begin()? else {
            return Ok(Submission::Ignored);
        };

        let prepared = match Self::prepare(file).await {
            Ok(prepared) => prepared,
            Err(e) => return self.cell.fail(generation, WorkflowEvent::ValidationFailed, e),
        };

        if !self.cell.advance(generation, WorkflowEvent::ValidationPassed)? {
            return Ok(Submission::Superseded);
        }

        let PreparedBatch {
            batch: NormalizedBatch { inputs, skipped },
            vacuous_rows,
        } = prepared;

        let results = match self.client.score_batch(&inputs).await {
            Ok(results) if results.len() == inputs.len() => results,
            Ok(results) => {
                let e = Error::contract(format!(
                    "sent {} records, received {} results",
                    inputs.len(),
                    results.len()
                ));
                return self.cell.fail(generation, WorkflowEvent::ScoringFailed, e);
            }
            Err(e) => return self.cell.fail(generation, WorkflowEvent::ScoringFailed, e),
        };

        self.cell.succeed(generation, || {
            let batch = self
                .session
                .replace(ScoredBatch::new(results, skipped, vacuous_rows));
            info!(
                "Batch {} scored: {} results ({} flagged), {} rows skipped, {} blank rows",
                batch.id,
                batch.scored_count(),
                batch.flagged_count(),
                batch.skipped_count(),
                batch.vacuous_rows
            );
            batch
        })
    }

    pub fn acknowledge(&self) -> Result<()> {
        self.cell.acknowledge()
    }

    pub fn abandon(&self) -> Result<()> {
        self.cell.abandon()
    }

    async fn prepare(file: Vec<u8>) -> Result<PreparedBatch> {
        let table = tokio::task::spawn_blocking(move || codec::decode(&file))
            .await
            .map_err(|e| Error::internal(format!("Decode task failed: {}", e)))??;

        let validated = schema::validate_table(&table)?;
        let batch = normalize::normalize_batch(validated.rows);
        if batch.inputs.is_empty() {
            return Err(Error::EmptyBatch);
        }

        Ok(PreparedBatch {
            batch,
            vacuous_rows: validated.vacuous_rows,
        })
    }
}
