use crate::Result;
use crate::errors::{AnalysisError, PreconditionError};
use crate::fallback;
use crate::logging::*;
use crate::normalize::normalize;
use crate::openai::VisionModel;
use crate::prompt;
use crate::types::{AnalysisMode, AnalysisRequest, AnalysisResult, DataUri, ImageView};
use rand::Rng;

fn required<'a>(image: &'a Option<DataUri>, view: ImageView) -> Result<&'a DataUri, PreconditionError> {
    image
        .as_ref()
        .filter(|uri| !uri.is_empty())
        .ok_or(PreconditionError::MissingImage(view))
}

/// Front, back and (when present) side images, in the order they are sent.
pub fn images(request: &AnalysisRequest) -> Result<Vec<&DataUri>, PreconditionError> {
    let mut images = vec![
        required(&request.front, ImageView::Front)?,
        required(&request.back, ImageView::Back)?,
    ];
    if let Some(side) = request.side.as_ref().filter(|uri| !uri.is_empty()) {
        images.push(side);
    }
    Ok(images)
}

/// Runs the prompt → model → normalizer pipeline for one request.
pub struct Analyzer<M> {
    model: M,
}

impl<M: VisionModel> Analyzer<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Analyzes the request. Transport and format failures resolve to a
    /// fallback result; only caller misuse is reported as an error.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, PreconditionError> {
        let outcome = self.try_analyze(request).await;
        settle(request.mode, outcome, &mut rand::rng())
    }

    /// Same as [`Analyzer::analyze`] with a caller-supplied random source for
    /// the fallback path.
    pub async fn analyze_with_rng<R: Rng + Send>(
        &self,
        request: &AnalysisRequest,
        rng: &mut R,
    ) -> Result<AnalysisResult, PreconditionError> {
        let outcome = self.try_analyze(request).await;
        settle(request.mode, outcome, rng)
    }

    /// The pipeline without the fallback: every failure is returned.
    pub async fn try_analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let log = DEFAULT.new(o!(
            "function" => "Analyzer::try_analyze",
            "mode" => request.mode.to_string(),
            "gender" => request.gender.to_string(),
        ));
        let images = images(request)?;
        info!(log, "starting analysis"; "images" => images.len());

        let prompt = prompt::build(request.gender, request.mode);
        let payload = self.model.analyze(&prompt, &images).await?;
        let result = normalize(&payload, request.mode)?;
        info!(log, "analysis completed"; "overall_score" => result.overall_score);
        Ok(result)
    }
}

fn settle<R: Rng>(
    mode: AnalysisMode,
    outcome: Result<AnalysisResult, AnalysisError>,
    rng: &mut R,
) -> Result<AnalysisResult, PreconditionError> {
    let log = DEFAULT.new(o!("function" => "settle", "mode" => mode.to_string()));
    match outcome {
        Ok(result) => Ok(result),
        Err(AnalysisError::Precondition(err)) => {
            warn!(log, "rejected request"; "error" => %err);
            Err(err)
        }
        Err(err) => {
            warn!(log, "analysis unavailable, using fallback"; "error" => %err);
            Ok(fallback::generate(mode, rng))
        }
    }
}
