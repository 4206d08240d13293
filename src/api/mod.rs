pub mod cli;

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;

use crate::core::{
    CalcError, DEFAULT_GOAL_RETURN_PERCENT, DEFAULT_STEP_UP_PERCENT, Field, Goal, GoalPlan,
    GoalPriority, InflationAdjusted, InstrumentProjection, Milestone, RateScenario, SipInputs,
    SipResult, StepUpResult, SwpInputs, SwpResult, TaxAdjusted, ValidationErrors, default_goals,
    inflation_adjusted, instrument_comparison, milestones, plan_goals, return_scenarios, step_up,
    suggest_from_sip, tax_adjusted, validate_goal, validate_percentage, validate_sip,
};
use crate::report::{
    Report, ReportError, ReportKind, SipInsights, SwpInsights, WithdrawalTimeline, sip_insights,
    swp_insights, withdrawal_timeline,
};
use crate::session::{CalculatorSession, DEFAULT_SIP_INPUTS, DEFAULT_SWP_INPUTS};
use crate::store::{JsonFileStore, SavedCalculation, ScenarioBook, ScenarioStore};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

pub const DEFAULT_INFLATION_PERCENT: f64 = 6.0;
pub const DEFAULT_TAX_PERCENT: f64 = 20.0;

pub type SharedStore = Box<dyn ScenarioStore + Send>;

#[derive(Clone)]
pub struct AppState {
    book: Arc<Mutex<ScenarioBook<SharedStore>>>,
}

impl AppState {
    pub fn new<S: ScenarioStore + Send + 'static>(store: S) -> Self {
        let store: SharedStore = Box::new(store);
        Self {
            book: Arc::new(Mutex::new(ScenarioBook::open(store))),
        }
    }

    fn book(&self) -> Result<MutexGuard<'_, ScenarioBook<SharedStore>>, Response> {
        lock_book(&self.book)
    }

    /// Runs a mutation on the blocking pool; every mutation rewrites the
    /// store, which may be file I/O.
    async fn update_book<T, F>(&self, update: F) -> Result<T, Response>
    where
        F: FnOnce(&mut ScenarioBook<SharedStore>) -> T + Send + 'static,
        T: Send + 'static,
    {
        let book = Arc::clone(&self.book);
        tokio::task::spawn_blocking(move || -> Result<T, Response> {
            let mut guard = lock_book(&book)?;
            Ok(update(&mut *guard))
        })
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "scenario book update task failed");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Saved calculations are unavailable",
            ))
        })
    }
}

fn lock_book(
    book: &Mutex<ScenarioBook<SharedStore>>,
) -> Result<MutexGuard<'_, ScenarioBook<SharedStore>>, Response> {
    book.lock().map_err(|_| {
        tracing::error!("scenario book lock poisoned");
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Saved calculations are unavailable",
        )
    })
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiReportKind {
    #[default]
    Sip,
    Swp,
    Combined,
}

impl From<ApiReportKind> for ReportKind {
    fn from(value: ApiReportKind) -> Self {
        match value {
            ApiReportKind::Sip => ReportKind::Sip,
            ApiReportKind::Swp => ReportKind::Swp,
            ApiReportKind::Combined => ReportKind::Combined,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SipPayload {
    investment_amount: Option<f64>,
    sip_duration: Option<f64>,
    annual_return: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SwpPayload {
    total_investment: Option<f64>,
    monthly_withdrawal: Option<f64>,
    annual_return: Option<f64>,

    use_sip_data: Option<bool>,
    investment_amount: Option<f64>,
    sip_duration: Option<f64>,
    sip_return: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AdvancedPayload {
    investment_amount: Option<f64>,
    sip_duration: Option<f64>,
    annual_return: Option<f64>,
    inflation_rate: Option<f64>,
    tax_rate: Option<f64>,
    step_up_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoalPayload {
    id: Option<i64>,
    name: String,
    amount: f64,
    years: f64,
    priority: Option<GoalPriority>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GoalsPayload {
    current_sip: Option<f64>,
    annual_return: Option<f64>,
    goals: Option<Vec<GoalPayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SavePayload {
    name: Option<String>,
    investment_amount: Option<f64>,
    sip_duration: Option<f64>,
    annual_return: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ReportPayload {
    kind: Option<ApiReportKind>,
    name: Option<String>,

    investment_amount: Option<f64>,
    sip_duration: Option<f64>,
    annual_return: Option<f64>,

    total_investment: Option<f64>,
    monthly_withdrawal: Option<f64>,
    withdrawal_return: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SavedReportQuery {
    kind: Option<ApiReportKind>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SipResponse {
    result: SipResult,
    insights: SipInsights,
    suggested_swp: SwpInputs,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwpResponse {
    result: SwpResult,
    milestones: Vec<Milestone>,
    insights: SwpInsights,
    timeline: WithdrawalTimeline,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdvancedResponse {
    inputs: SipInputs,
    inflation: InflationAdjusted,
    tax: TaxAdjusted,
    step_up: StepUpResult,
    scenarios: Vec<RateScenario>,
    instruments: Vec<InstrumentProjection>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct ValidationResponse<'a> {
    error: String,
    fields: &'a ValidationErrors,
}

#[derive(Debug, Serialize)]
struct ClearedResponse {
    cleared: usize,
}

fn sip_inputs_from_payload(payload: &SipPayload) -> SipInputs {
    overlay_sip(
        payload.investment_amount,
        payload.sip_duration,
        payload.annual_return,
    )
}

fn overlay_sip(amount: Option<f64>, duration: Option<f64>, rate: Option<f64>) -> SipInputs {
    let mut inputs = DEFAULT_SIP_INPUTS;
    if let Some(v) = amount {
        inputs.investment_amount = v;
    }
    if let Some(v) = duration {
        inputs.sip_duration = v;
    }
    if let Some(v) = rate {
        inputs.annual_return = v;
    }
    inputs
}

fn overlay_swp(
    base: SwpInputs,
    corpus: Option<f64>,
    withdrawal: Option<f64>,
    rate: Option<f64>,
) -> SwpInputs {
    let mut inputs = base;
    if let Some(v) = corpus {
        inputs.total_investment = v;
    }
    if let Some(v) = withdrawal {
        inputs.monthly_withdrawal = v;
    }
    if let Some(v) = rate {
        inputs.annual_return = v;
    }
    inputs
}

fn goals_from_payload(payload: Option<Vec<GoalPayload>>) -> Result<Vec<Goal>, String> {
    let Some(goals) = payload else {
        return Ok(default_goals());
    };
    goals
        .into_iter()
        .enumerate()
        .map(|(index, goal)| -> Result<Goal, String> {
            validate_goal(&goal.name, goal.amount, goal.years)
                .into_result()
                .map_err(|errors| format!("goal {}: {errors}", index + 1))?;
            Ok(Goal {
                id: goal.id.unwrap_or(index as i64 + 1),
                name: goal.name.trim().to_string(),
                amount: goal.amount,
                years: goal.years,
                priority: goal.priority.unwrap_or(GoalPriority::Medium),
            })
        })
        .collect()
}

fn calculate_sip_for(inputs: SipInputs) -> Result<SipResult, Response> {
    let mut session = CalculatorSession::new();
    let result = session.update_sip(inputs).cloned();
    result.ok_or_else(|| validation_response(session.errors()))
}

fn calculate_swp_for(inputs: SwpInputs) -> Result<SwpResult, Response> {
    let mut session = CalculatorSession::new();
    let result = session.update_swp(inputs).cloned();
    result.ok_or_else(|| validation_response(session.errors()))
}

fn build_sip_response(result: SipResult) -> SipResponse {
    SipResponse {
        insights: sip_insights(&result),
        suggested_swp: suggest_from_sip(&result),
        result,
    }
}

fn build_swp_response(result: SwpResult) -> SwpResponse {
    SwpResponse {
        milestones: milestones(&result),
        insights: swp_insights(&result),
        timeline: withdrawal_timeline(&result),
        result,
    }
}

fn build_advanced_response(payload: &AdvancedPayload) -> Result<AdvancedResponse, ValidationErrors> {
    let inputs = overlay_sip(
        payload.investment_amount,
        payload.sip_duration,
        payload.annual_return,
    );
    let inflation_rate = payload.inflation_rate.unwrap_or(DEFAULT_INFLATION_PERCENT);
    let tax_rate = payload.tax_rate.unwrap_or(DEFAULT_TAX_PERCENT);
    let step_up_rate = payload.step_up_rate.unwrap_or(DEFAULT_STEP_UP_PERCENT);

    let mut errors = validate_sip(&inputs);
    errors.record(
        Field::InflationRate,
        validate_percentage(inflation_rate, "Inflation rate"),
    );
    errors.record(
        Field::TaxRate,
        validate_percentage(tax_rate, "Tax rate"),
    );
    errors.record(
        Field::StepUpRate,
        validate_percentage(step_up_rate, "Step-up rate"),
    );
    errors.clone().into_result()?;

    // Validation above is stricter than the calculators' own guards.
    let calc = |err: CalcError| {
        tracing::warn!(error = %err, "advanced analysis rejected validated inputs");
        errors.clone()
    };
    Ok(AdvancedResponse {
        inputs,
        inflation: inflation_adjusted(&inputs, inflation_rate).map_err(calc)?,
        tax: tax_adjusted(&inputs, tax_rate).map_err(calc)?,
        step_up: step_up(&inputs, step_up_rate).map_err(calc)?,
        scenarios: return_scenarios(&inputs).map_err(calc)?,
        instruments: instrument_comparison(&inputs).map_err(calc)?,
    })
}

fn build_goal_plan(payload: GoalsPayload) -> Result<GoalPlan, String> {
    let current_sip = payload
        .current_sip
        .unwrap_or(DEFAULT_SIP_INPUTS.investment_amount);
    if !current_sip.is_finite() || current_sip < 0.0 {
        return Err("currentSip must be a non-negative number".to_string());
    }
    let annual_return = payload.annual_return.unwrap_or(DEFAULT_GOAL_RETURN_PERCENT);
    if !annual_return.is_finite() || annual_return < 0.0 {
        return Err("annualReturn must be a non-negative number".to_string());
    }
    let goals = goals_from_payload(payload.goals)?;
    Ok(plan_goals(&goals, current_sip, annual_return))
}

fn build_report(payload: ReportPayload) -> Result<Report, Response> {
    let kind: ReportKind = payload.kind.unwrap_or_default().into();
    let name = payload.name.unwrap_or_default();
    let sip_inputs = overlay_sip(
        payload.investment_amount,
        payload.sip_duration,
        payload.annual_return,
    );
    let generated_at = Utc::now();

    let report = match kind {
        ReportKind::Sip => {
            let sip = calculate_sip_for(sip_inputs)?;
            Report::sip(&name, Some(&sip), generated_at)
        }
        ReportKind::Swp => {
            let inputs = overlay_swp(
                DEFAULT_SWP_INPUTS,
                payload.total_investment,
                payload.monthly_withdrawal,
                payload.withdrawal_return,
            );
            let swp = calculate_swp_for(inputs)?;
            Report::swp(&name, Some(&swp), generated_at)
        }
        ReportKind::Combined => {
            let sip = calculate_sip_for(sip_inputs)?;
            let inputs = overlay_swp(
                suggest_from_sip(&sip),
                payload.total_investment,
                payload.monthly_withdrawal,
                payload.withdrawal_return,
            );
            let swp = calculate_swp_for(inputs)?;
            Report::combined(&name, Some(&sip), Some(&swp), generated_at)
        }
    };
    report.map_err(report_error_response)
}

fn build_saved_report(saved: &SavedCalculation, kind: ApiReportKind) -> Result<Report, ReportError> {
    let mut session = CalculatorSession::new();
    session.load_saved(saved);
    let generated_at = Utc::now();
    match kind {
        ApiReportKind::Sip => Report::sip(&saved.name, session.sip_result(), generated_at),
        ApiReportKind::Swp | ApiReportKind::Combined => {
            session.seed_swp_from_sip();
            if kind == ApiReportKind::Swp {
                Report::swp(&saved.name, session.swp_result(), generated_at)
            } else {
                Report::combined(
                    &saved.name,
                    session.sip_result(),
                    session.swp_result(),
                    generated_at,
                )
            }
        }
    }
}

pub async fn run_http_server(port: u16, data_dir: PathBuf) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(data_dir = %data_dir.display(), "opening saved calculations");
    let state = AppState::new(JsonFileStore::new(data_dir));
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "SIP calculator HTTP API listening");
    println!("SIP calculator listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/sip", get(sip_get_handler).post(sip_post_handler))
        .route("/api/swp", get(swp_get_handler).post(swp_post_handler))
        .route(
            "/api/advanced",
            get(advanced_get_handler).post(advanced_post_handler),
        )
        .route("/api/goals", get(goals_get_handler).post(goals_post_handler))
        .route(
            "/api/scenarios",
            get(scenarios_list_handler)
                .post(scenarios_save_handler)
                .delete(scenarios_clear_handler),
        )
        .route(
            "/api/scenarios/:id",
            get(scenario_get_handler).delete(scenario_delete_handler),
        )
        .route("/api/scenarios/:id/report", get(scenario_report_handler))
        .route("/api/report", axum::routing::post(report_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn sip_get_handler(Query(payload): Query<SipPayload>) -> Response {
    sip_handler_impl(payload)
}

async fn sip_post_handler(Json(payload): Json<SipPayload>) -> Response {
    sip_handler_impl(payload)
}

fn sip_handler_impl(payload: SipPayload) -> Response {
    let inputs = sip_inputs_from_payload(&payload);
    match calculate_sip_for(inputs) {
        Ok(result) => json_response(StatusCode::OK, build_sip_response(result)),
        Err(response) => response,
    }
}

async fn swp_get_handler(Query(payload): Query<SwpPayload>) -> Response {
    swp_handler_impl(payload)
}

async fn swp_post_handler(Json(payload): Json<SwpPayload>) -> Response {
    swp_handler_impl(payload)
}

fn swp_handler_impl(payload: SwpPayload) -> Response {
    let mut session = CalculatorSession::new();
    let result = if payload.use_sip_data.unwrap_or(false) {
        let sip_inputs = overlay_sip(
            payload.investment_amount,
            payload.sip_duration,
            payload.sip_return,
        );
        if session.update_sip(sip_inputs).is_none() {
            return validation_response(session.errors());
        }
        session.seed_swp_from_sip().cloned()
    } else {
        let inputs = overlay_swp(
            DEFAULT_SWP_INPUTS,
            payload.total_investment,
            payload.monthly_withdrawal,
            payload.annual_return,
        );
        session.update_swp(inputs).cloned()
    };

    match result {
        Some(result) => json_response(StatusCode::OK, build_swp_response(result)),
        None => validation_response(session.errors()),
    }
}

async fn advanced_get_handler(Query(payload): Query<AdvancedPayload>) -> Response {
    advanced_handler_impl(payload)
}

async fn advanced_post_handler(Json(payload): Json<AdvancedPayload>) -> Response {
    advanced_handler_impl(payload)
}

fn advanced_handler_impl(payload: AdvancedPayload) -> Response {
    match build_advanced_response(&payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(errors) => validation_response(&errors),
    }
}

async fn goals_get_handler(Query(payload): Query<GoalsPayload>) -> Response {
    goals_handler_impl(payload)
}

async fn goals_post_handler(Json(payload): Json<GoalsPayload>) -> Response {
    goals_handler_impl(payload)
}

fn goals_handler_impl(payload: GoalsPayload) -> Response {
    match build_goal_plan(payload) {
        Ok(plan) => json_response(StatusCode::OK, plan),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn scenarios_list_handler(State(state): State<AppState>) -> Response {
    let book = match state.book() {
        Ok(book) => book,
        Err(response) => return response,
    };
    json_response(StatusCode::OK, book.list())
}

async fn scenarios_save_handler(
    State(state): State<AppState>,
    Json(payload): Json<SavePayload>,
) -> Response {
    let inputs = overlay_sip(
        payload.investment_amount,
        payload.sip_duration,
        payload.annual_return,
    );
    let result = match calculate_sip_for(inputs) {
        Ok(result) => result,
        Err(response) => return response,
    };
    let name = payload.name.unwrap_or_default();
    let appended = state
        .update_book(move |book| book.append(&name, inputs, &result))
        .await;
    match appended {
        Ok(Ok(saved)) => json_response(StatusCode::CREATED, saved),
        Ok(Err(err)) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
        Err(response) => response,
    }
}

async fn scenarios_clear_handler(State(state): State<AppState>) -> Response {
    let cleared = state
        .update_book(|book| {
            let cleared = book.len();
            book.clear();
            cleared
        })
        .await;
    match cleared {
        Ok(cleared) => json_response(StatusCode::OK, ClearedResponse { cleared }),
        Err(response) => response,
    }
}

async fn scenario_get_handler(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let book = match state.book() {
        Ok(book) => book,
        Err(response) => return response,
    };
    match book.get(id) {
        Some(saved) => json_response(StatusCode::OK, saved),
        None => scenario_not_found(id),
    }
}

async fn scenario_delete_handler(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.update_book(move |book| book.remove(id)).await {
        Ok(Some(removed)) => json_response(StatusCode::OK, removed),
        Ok(None) => scenario_not_found(id),
        Err(response) => response,
    }
}

async fn scenario_report_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<SavedReportQuery>,
) -> Response {
    let saved = {
        let book = match state.book() {
            Ok(book) => book,
            Err(response) => return response,
        };
        match book.get(id) {
            Some(saved) => saved.clone(),
            None => return scenario_not_found(id),
        }
    };
    match build_saved_report(&saved, query.kind.unwrap_or_default()) {
        Ok(report) => report_response(report),
        Err(err) => report_error_response(err),
    }
}

async fn report_handler(Json(payload): Json<ReportPayload>) -> Response {
    match build_report(payload) {
        Ok(report) => report_response(report),
        Err(response) => response,
    }
}

fn scenario_not_found(id: i64) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        &format!("No saved calculation with id {id}"),
    )
}

fn report_response(report: Report) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", report.filename());
    tracing::info!(name = report.name(), pages = report.page_count(), "generated report");
    let mut response = with_cache_control((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        report.into_bytes(),
    ));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

fn report_error_response(err: ReportError) -> Response {
    tracing::warn!(error = %err, "report generation failed");
    error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string())
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn validation_response(errors: &ValidationErrors) -> Response {
    let error = if errors.is_empty() {
        "Invalid input".to_string()
    } else {
        errors.to_string()
    };
    json_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        ValidationResponse {
            error,
            fields: errors,
        },
    )
}
