use axum::extract::State;
use axum::response::Html;
use axum::Form;
use serde::Deserialize;
use tracing::{info, info_span, warn, Instrument};

use crate::error::ClassifyError;
use crate::service::is_blank;
use crate::state::AppState;
use crate::templates::page::{self, Outcome};

#[derive(Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub message: String,
}

pub async fn form() -> Html<String> {
    Html(page::render("", None))
}

pub async fn submit(State(state): State<AppState>, Form(form): Form<SubmitForm>) -> Html<String> {
    let message = form.message;

    if is_blank(&message) {
        state.stats.record_error(&ClassifyError::EmptyInput);
        return Html(page::render(&message, Some(&Outcome::Warning)));
    }

    let span = info_span!("submit", request_id = %uuid::Uuid::new_v4());
    let outcome = async {
        match state.run_classification(vec![message.clone()]).await {
            Ok(mut verdicts) => match verdicts.pop() {
                Some(verdict) => {
                    info!("[spamcheck] Form verdict: {}", verdict.label.as_str());
                    Outcome::Verdict(verdict)
                }
                None => Outcome::Error("model returned no score".to_string()),
            },
            Err(ClassifyError::EmptyInput) => Outcome::Warning,
            Err(e) => {
                warn!("[spamcheck] Form classification failed: {}", e);
                Outcome::Error(e.to_string())
            }
        }
    }
    .instrument(span)
    .await;

    Html(page::render(&message, Some(&outcome)))
}
