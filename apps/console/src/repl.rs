use std::io::Write;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use auth_cell::{AuthService, LoginForm, SessionStore, SignupForm, View};
use doctor_cell::{Doctor, RecommendationService};
use patient_cell::{QueueEntry, QueueMonitor, QueueService, QueueSnapshot};
use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::chat::MessageRole;
use shared_models::triage::{AnalysisUpdate, TriageMetadata};
use shared_utils::validation::password_strength;
use triage_cell::{ChatSession, ChatUpdate, TriageStreamClient, TurnOutcome};

use crate::alerts::TerminalBell;
use crate::commands::{Command, HELP_TEXT};

type Input = Lines<BufReader<Stdin>>;

pub struct Console {
    config: Arc<AppConfig>,
    sessions: Arc<SessionStore>,
    auth: AuthService,
    chat: Arc<ChatSession>,
    recommendations: RecommendationService,
    queue: Arc<QueueService>,
    monitor: Option<QueueMonitor>,
    last_analysis: Arc<Mutex<Option<AnalysisUpdate>>>,
    shutdown: CancellationToken,
}

impl Console {
    pub fn new(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let transport = Arc::new(TriageStreamClient::new(&config)?);
        let chat = Arc::new(ChatSession::new(transport, Arc::new(TerminalBell)));

        Ok(Self {
            sessions: Arc::new(SessionStore::new()),
            auth: AuthService::new(&config)?,
            chat,
            recommendations: RecommendationService::new(&config)?,
            queue: Arc::new(QueueService::new(&config)?),
            monitor: None,
            last_analysis: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
            config,
        })
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let printer = self.spawn_printer();
        let mut input = BufReader::new(tokio::io::stdin()).lines();

        println!("AI Health Triage. Type /help for commands.");
        println!("Please /login or /signup to start.");

        loop {
            prompt_marker(self.sessions.active_view())?;
            let Some(line) = input.next_line().await? else {
                break;
            };

            match Command::parse(&line) {
                Command::Empty => {}
                Command::Help => println!("{}", HELP_TEXT),
                Command::Quit => break,
                Command::Signup => self.signup(&mut input).await?,
                Command::Login => self.login(&mut input).await?,
                Command::Logout => self.logout().await,
                Command::WhoAmI => self.whoami(),
                Command::Queue => self.show_queue().await,
                Command::Recommend(symptoms) => self.recommend(&symptoms).await,
                Command::Clear => self.chat.clear(),
                Command::History => self.history(),
                Command::Chat(text) => self.send(text),
                Command::Unknown(name) => println!("Unknown command {}. Try /help.", name),
            }
        }

        info!("Shutting down");
        self.chat.clear();
        if let Some(monitor) = self.monitor.take() {
            monitor.shutdown().await;
        }
        self.shutdown.cancel();
        if let Err(err) = printer.await {
            warn!("Output task failed: {}", err);
        }
        Ok(())
    }

    async fn login(&mut self, input: &mut Input) -> anyhow::Result<()> {
        let Some(email) = ask(input, "Email: ").await? else {
            return Ok(());
        };
        let Some(password) = ask(input, "Password: ").await? else {
            return Ok(());
        };

        match self.auth.login(&LoginForm::new(email, password)).await {
            Ok(session) => self.start_session(session),
            Err(err) => println!("{}", err.user_message()),
        }
        Ok(())
    }

    async fn signup(&mut self, input: &mut Input) -> anyhow::Result<()> {
        let mut form = SignupForm::default();
        let fields: [(&str, &mut String); 4] = [
            ("Full name: ", &mut form.name),
            ("Contact (10 digits): ", &mut form.contact),
            ("Email: ", &mut form.email),
            ("Password: ", &mut form.password),
        ];
        for (label, field) in fields {
            let Some(value) = ask(input, label).await? else {
                return Ok(());
            };
            *field = value;
        }

        if let Some(strength) = password_strength(&form.password) {
            println!("Password strength: {:?}", strength);
        }

        if let Some(age) = ask(input, "Age (optional): ").await? {
            if !age.is_empty() {
                match age.parse::<u32>() {
                    Ok(age) => form.age = Some(age),
                    Err(_) => println!("Ignoring age {:?}, not a number", age),
                }
            }
        }
        if let Some(gender) = ask(input, "Gender (optional): ").await? {
            form.gender = Some(gender).filter(|g| !g.is_empty());
        }

        match self.auth.signup_and_login(&form).await {
            Ok(session) => self.start_session(session),
            Err(err) => println!("{}", err.user_message()),
        }
        Ok(())
    }

    fn start_session(&mut self, session: Session) {
        println!("Welcome, {}!", session.name);
        self.sessions.login(session);
        self.chat.clear();
        *lock(&self.last_analysis) = None;

        if self.monitor.is_none() {
            self.monitor = Some(QueueMonitor::spawn(
                self.queue.clone(),
                self.config.queue_poll_interval,
                self.shutdown.child_token(),
            ));
        }

        if let Some(greeting) = self.chat.messages().first() {
            println!("assistant> {}", greeting.content);
        }
    }

    async fn logout(&mut self) {
        match self.sessions.logout() {
            Some(session) => println!("Goodbye, {}.", session.name),
            None => println!("Not logged in."),
        }
        self.chat.clear();
        *lock(&self.last_analysis) = None;
        if let Some(monitor) = self.monitor.take() {
            monitor.shutdown().await;
        }
    }

    fn whoami(&self) {
        match self.sessions.current() {
            Some(session) => {
                let id = session
                    .id
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "-".to_string());
                println!("{} <{}> contact {} (id {})", session.name, session.email, session.contact, id);
            }
            None => println!("Not logged in."),
        }
    }

    fn send(&self, text: String) {
        let Some(session) = self.require_session() else {
            return;
        };

        let chat = self.chat.clone();
        tokio::spawn(async move {
            match chat.send(&text, session.id).await {
                Ok(TurnOutcome::Superseded) => debug!("Turn superseded"),
                Ok(outcome) => debug!("Turn finished: {:?}", outcome),
                Err(err) => println!("{}", err.user_message()),
            }
        });
    }

    async fn show_queue(&self) {
        if self.require_session().is_none() {
            return;
        }

        let latest = self.monitor.as_ref().and_then(QueueMonitor::latest);
        let snapshot = match latest {
            Some(snapshot) => snapshot,
            None => match self.queue.snapshot().await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    println!("Failed to load queue: {}", err.user_message());
                    return;
                }
            },
        };

        let analysis = lock(&self.last_analysis).clone();
        let current = analysis.map(|a| {
            let name = self.sessions.current().map(|s| s.name).unwrap_or_default();
            QueueEntry::from_analysis(&name, &a)
        });
        print_queue(&snapshot, current.as_ref());
    }

    async fn recommend(&self, symptoms: &str) {
        if self.require_session().is_none() {
            return;
        }

        let symptoms = if symptoms.is_empty() {
            lock(&self.last_analysis)
                .as_ref()
                .map(|a| a.symptoms.join(" "))
                .unwrap_or_default()
        } else {
            symptoms.to_string()
        };
        if symptoms.is_empty() {
            println!("Usage: /recommend <symptoms>");
            return;
        }

        let doctors = self.recommendations.recommend_or_empty(&symptoms).await;
        if doctors.is_empty() {
            println!("No doctors found.");
        }
        for doctor in &doctors {
            print_doctor(doctor);
        }
    }

    fn history(&self) {
        for message in self.chat.messages() {
            let role = match message.role {
                MessageRole::User => "you",
                MessageRole::Assistant => "assistant",
            };
            println!(
                "[{}] {}> {}",
                message.timestamp.format("%H:%M"),
                role,
                message.content
            );
        }
    }

    fn require_session(&self) -> Option<Session> {
        let session = self.sessions.current();
        if session.is_none() {
            println!("Please /login or /signup first.");
        }
        session
    }

    fn spawn_printer(&self) -> JoinHandle<()> {
        let mut updates = self.chat.subscribe();
        let last_analysis = self.last_analysis.clone();
        let cancel = self.shutdown.clone();

        tokio::spawn(async move {
            let mut printer = TurnPrinter::default();
            loop {
                let update = tokio::select! {
                    _ = cancel.cancelled() => break,
                    update = updates.recv() => update,
                };

                match update {
                    Ok(ChatUpdate::Analysis(analysis)) => {
                        *lock(&last_analysis) = Some(analysis);
                    }
                    Ok(update) => printer.render(update),
                    Err(RecvError::Lagged(skipped)) => warn!("Skipped {} chat updates", skipped),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

/// Renders one assistant turn as it streams in.
#[derive(Default)]
struct TurnPrinter {
    streamed: bool,
    metadata: Option<TriageMetadata>,
}

impl TurnPrinter {
    fn render(&mut self, update: ChatUpdate) {
        match update {
            ChatUpdate::TurnStarted { .. } => {
                *self = Self::default();
                print!("assistant> ");
            }
            ChatUpdate::Delta { content, .. } => {
                self.streamed = true;
                print!("{}", content);
            }
            ChatUpdate::MetadataAttached { metadata, .. } => {
                self.metadata = Some(*metadata);
            }
            ChatUpdate::Settled { content, outcome, .. } => {
                if !self.streamed || matches!(outcome, TurnOutcome::Failed { .. }) {
                    print!("{}", content);
                }
                println!();
                if let Some(metadata) = self.metadata.take().filter(TriageMetadata::is_medical) {
                    print_triage(&metadata);
                }
            }
            ChatUpdate::Cleared => {
                *self = Self::default();
                println!("\n(conversation cleared)");
            }
            ChatUpdate::Analysis(_) => {}
        }
        let _ = std::io::stdout().flush();
    }
}

fn print_triage(metadata: &TriageMetadata) {
    let risk = metadata.normalized_risk().unwrap_or_else(|| "low".to_string());
    println!("  Risk: {}", risk.to_uppercase());
    if let Some(confidence) = &metadata.confidence {
        println!("  Confidence: {}%", confidence);
    }
    if !metadata.symptoms.is_empty() {
        println!("  Symptoms: {}", metadata.symptoms.join(", "));
    }
    if let Some(doctor) = &metadata.doctor {
        println!("  Specialist: {}", doctor);
    }
    for doctor in &metadata.recommended_doctors {
        print!("  ");
        print_doctor(doctor);
    }
}

fn print_doctor(doctor: &Doctor) {
    let mut line = format!("[{}] {}", doctor.initials(), doctor.name);
    if let Some(specialization) = &doctor.specialization {
        line.push_str(&format!(" - {}", specialization));
    }
    if let Some(location) = doctor.location() {
        line.push_str(&format!(" @ {}", location));
    }
    if let Some(score) = doctor.match_score {
        line.push_str(&format!(" ({:.0}% match)", score));
    }
    if let Some(availability) = &doctor.availability {
        line.push_str(&format!(", {}", availability));
    }
    println!("{}", line);
}

fn print_queue(snapshot: &QueueSnapshot, current: Option<&QueueEntry>) {
    let summary = &snapshot.summary;
    println!(
        "Patients: {} | Critical cases: {} | Avg wait: {} min | Updated {}",
        summary.total,
        summary.urgent,
        summary.average_wait_minutes,
        snapshot.fetched_at.format("%H:%M:%S")
    );

    if snapshot.entries.is_empty() && current.is_none() {
        println!("No patients in queue");
        return;
    }

    for entry in current.into_iter().chain(snapshot.entries.iter()) {
        let severity = entry.severity.as_deref().unwrap_or("-").to_uppercase();
        let age = entry.age.map(|a| a.to_string()).unwrap_or_else(|| "--".to_string());
        let gender = entry.gender.as_deref().unwrap_or("--");
        println!(
            "{:>9}  {} ({}, {})  {}  [{} / {}]",
            severity,
            entry.name,
            age,
            gender,
            entry.symptoms.join(", "),
            entry.status.as_deref().unwrap_or("-"),
            entry.wait_time.as_deref().unwrap_or("-"),
        );
    }
}

fn prompt_marker(view: View) -> anyhow::Result<()> {
    match view {
        View::Auth => print!("guest> "),
        View::Dashboard => print!("you> "),
    }
    std::io::stdout().flush()?;
    Ok(())
}

async fn ask(input: &mut Input, label: &str) -> anyhow::Result<Option<String>> {
    print!("{}", label);
    std::io::stdout().flush()?;
    Ok(input.next_line().await?.map(|line| line.trim().to_string()))
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
