//! One function per subcommand.
//!
//! Commands write human-readable text to `out` and leave every session change
//! to the core: form submission commits through `commit_session`, and a 401
//! has already invalidated the session by the time an error reaches here.
//! The session lock is never held across a request.

#[cfg(test)]
#[path = "commands_test.rs"]
mod commands_test;

use std::io::Write;

use eunoia::api::{BehavioralData, Transport};
use eunoia::dashboard::load_dashboard;
use eunoia::forms::{self, LoginForm, RegisterForm, SubmitError};
use eunoia::patterns::Timeframe;
use eunoia::risk::{RiskLevel, display_score, factor_bars};
use eunoia::{ApiClient, Page, SharedSession};

use crate::CliError;

/// Self-report inputs for `assess`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Ratings {
    pub sleep_hours: f64,
    pub activity_level: u8,
    pub mood_rating: u8,
    pub stress_level: u8,
    pub posts: Vec<String>,
}

impl Ratings {
    fn to_request(&self, user_id: String) -> BehavioralData {
        BehavioralData {
            user_id,
            social_media_posts: self.posts.iter().map(|p| p.trim()).filter(|p| !p.is_empty()).map(str::to_owned).collect(),
            sleep_hours: Some(self.sleep_hours).filter(|h| (0.0..=24.0).contains(h)),
            activity_level: Some(self.activity_level),
            mood_rating: Some(self.mood_rating),
            stress_level: Some(self.stress_level),
        }
    }
}

fn form_error<F: Copy + PartialEq>(err: SubmitError<F>) -> CliError {
    match err {
        SubmitError::Invalid(fields) => {
            CliError::Form(fields.iter().map(|(_, message)| message).collect::<Vec<_>>().join("; "))
        }
        SubmitError::Rejected(failure, _) => CliError::Form(failure.message().to_owned()),
        SubmitError::Session(e) => CliError::Session(e),
    }
}

/// Run the navigation guard; fails unless `page` is what would render.
fn enter(session: &SharedSession, page: Page) -> Result<(), CliError> {
    let mut ctx = session.lock();
    ctx.navigate(page);
    if ctx.rendered_page() == page { Ok(()) } else { Err(CliError::NotSignedIn) }
}

fn date_of(timestamp: Option<&str>) -> &str {
    timestamp.and_then(|t| t.split('T').next()).filter(|d| !d.is_empty()).unwrap_or("-")
}

// =============================================================================
// ACCOUNT
// =============================================================================

pub(crate) async fn login<T: Transport>(
    api: &ApiClient<T>,
    session: &SharedSession,
    email: String,
    password: String,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let form = LoginForm::new(email, password);
    forms::login(api, session, &form).await.map_err(form_error)?;
    writeln!(out, "Signed in as {}", form.email.trim())?;
    Ok(())
}

pub(crate) async fn register<T: Transport>(
    api: &ApiClient<T>,
    session: &SharedSession,
    form: RegisterForm,
    out: &mut impl Write,
) -> Result<(), CliError> {
    forms::register(api, session, &form).await.map_err(form_error)?;
    writeln!(out, "Account created for {}", form.email.trim())?;
    Ok(())
}

pub(crate) fn logout(session: &SharedSession, out: &mut impl Write) -> Result<(), CliError> {
    session.lock().logout();
    writeln!(out, "Signed out")?;
    Ok(())
}

pub(crate) fn status(session: &SharedSession, out: &mut impl Write) -> Result<(), CliError> {
    let ctx = session.snapshot();
    match ctx.session() {
        Some(s) => {
            writeln!(out, "Signed in as {}", if s.user_email.is_empty() { "(unknown email)" } else { &s.user_email })?;
            writeln!(out, "User id: {}", s.user_id)?;
        }
        None => writeln!(out, "Not signed in")?,
    }
    writeln!(out, "Page: {}", ctx.rendered_page())?;
    Ok(())
}

pub(crate) fn navigate(session: &SharedSession, page: Page, out: &mut impl Write) -> Result<(), CliError> {
    let shown = {
        let mut ctx = session.lock();
        ctx.navigate(page);
        ctx.rendered_page()
    };
    writeln!(out, "{shown}")?;
    Ok(())
}

// =============================================================================
// PROTECTED VIEWS
// =============================================================================

pub(crate) async fn profile<T: Transport>(
    api: &ApiClient<T>,
    session: &SharedSession,
    out: &mut impl Write,
) -> Result<(), CliError> {
    enter(session, Page::Profile)?;
    let profile = api.profile().await?;
    let user = profile.user;
    let name = match user.last_name.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        Some(last) => format!("{} {last}", user.first_name),
        None => user.first_name,
    };
    writeln!(out, "Name: {name}")?;
    let email = user.email.or_else(|| session.lock().session().map(|s| s.user_email));
    writeln!(out, "Email: {}", email.as_deref().unwrap_or("-"))?;
    Ok(())
}

pub(crate) async fn assessments<T: Transport>(
    api: &ApiClient<T>,
    session: &SharedSession,
    out: &mut impl Write,
) -> Result<(), CliError> {
    enter(session, Page::Dashboard)?;
    let records = api.user_assessments().await?;
    if records.is_empty() {
        writeln!(out, "No assessments yet")?;
        return Ok(());
    }
    for record in &records {
        let level = RiskLevel::from_score(record.risk_score);
        writeln!(
            out,
            "{:<10}  {:>3.0}  {}",
            date_of(record.timestamp.as_deref()),
            display_score(record.risk_score),
            level.label()
        )?;
    }
    Ok(())
}

pub(crate) async fn dashboard<T: Transport>(
    api: &ApiClient<T>,
    session: &SharedSession,
    timeframe: Timeframe,
    out: &mut impl Write,
) -> Result<(), CliError> {
    enter(session, Page::Dashboard)?;
    let data = load_dashboard(api).await?;

    writeln!(out, "{}", data.greeting())?;
    let Some(level) = data.latest_level() else {
        writeln!(out, "No assessments yet. Run `eunoia assess` to take your first one.")?;
        return Ok(());
    };
    let score = data.latest_risk_score.map_or(0.0, display_score);
    writeln!(out, "Latest score: {score:.0} ({})", level.label())?;
    writeln!(out, "{}", level.recommendation())?;

    let series = data.series(timeframe);
    if let Some(average) = series.average() {
        writeln!(out, "{} average over {} assessment(s): {average:.0}", timeframe.label(), series.len())?;
    }
    if let Some(trend) = series.trend() {
        writeln!(out, "Trend: {}", trend.label())?;
    }
    Ok(())
}

pub(crate) async fn analyze<T: Transport>(
    api: &ApiClient<T>,
    session: &SharedSession,
    text: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    enter(session, Page::RiskAssessment)?;
    let user_id = session.lock().user_id().ok_or(CliError::NotSignedIn)?;
    let analysis = api.analyze_text(text, &user_id).await?;
    writeln!(out, "Analysis {}", analysis.analysis_id)?;
    writeln!(out, "Sentiment: {}", serde_json::to_string_pretty(&analysis.sentiment)?)?;
    writeln!(out, "Indicators: {}", serde_json::to_string_pretty(&analysis.mental_health_indicators)?)?;
    Ok(())
}

pub(crate) async fn assess<T: Transport>(
    api: &ApiClient<T>,
    session: &SharedSession,
    ratings: Ratings,
    out: &mut impl Write,
) -> Result<(), CliError> {
    enter(session, Page::RiskAssessment)?;
    let user_id = session.lock().user_id().ok_or(CliError::NotSignedIn)?;
    let result = api.perform_risk_assessment(&ratings.to_request(user_id)).await?;

    let level = RiskLevel::from_score(result.risk_score);
    writeln!(out, "Risk score: {:.0} ({})", display_score(result.risk_score), level.label())?;
    writeln!(out, "{}", level.description())?;
    for bar in factor_bars(&result.factors) {
        writeln!(out, "  {:<24} {:>3.0}%", bar.label(), bar.percent)?;
    }
    for recommendation in &result.recommendations {
        writeln!(out, "- {recommendation}")?;
    }
    Ok(())
}
