//! Per-view similarity scoring and reduction to an overall score.
//!
//! The six comparisons run concurrently on the caller's task. Every view ends
//! in its own `Result` slot before reduction, so one failing view never
//! aborts its siblings and scoring itself never fails. A comparator that
//! panics while polled settles its slot like any other failure.

use std::future::{poll_fn, Future};
use std::panic::{self, AssertUnwindSafe};
use std::pin::pin;
use std::task::Poll;

use shared::{ImagePayload, ScoreResult, ViewImages, ViewName, ViewScore};
use thiserror::Error;

use crate::i18n::{t, Lang};

pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComparatorError {
    #[error("comparator unavailable: {0}")]
    Unavailable(String),
    #[error("comparator request failed: {0}")]
    Request(String),
    #[error("comparator returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// External single-pair image comparison. Must be safe to call for all six
/// views at once.
pub trait ImageComparator {
    fn compare(
        &self,
        view: ViewName,
        user: &ImagePayload,
        reference: &ImagePayload,
    ) -> impl Future<Output = Result<ViewScore, ComparatorError>> + Send;
}

#[derive(Debug)]
enum ViewFailure {
    Missing,
    Comparator(ComparatorError),
    Panicked,
}

/// Drive one slot, turning a panic inside it into [`ViewFailure::Panicked`].
async fn catch_panic<T>(
    slot: impl Future<Output = Result<T, ViewFailure>>,
) -> Result<T, ViewFailure> {
    let mut slot = pin!(slot);
    poll_fn(move |cx| {
        match panic::catch_unwind(AssertUnwindSafe(|| slot.as_mut().poll(cx))) {
            Ok(poll) => poll,
            Err(_) => Poll::Ready(Err(ViewFailure::Panicked)),
        }
    })
    .await
}

async fn compare_view<C: ImageComparator>(
    comparator: &C,
    view: ViewName,
    user: &ViewImages,
    reference: &ViewImages,
) -> Result<ViewScore, ViewFailure> {
    let (Some(user_image), Some(reference_image)) = (user.get(&view), reference.get(&view)) else {
        return Err(ViewFailure::Missing);
    };
    comparator
        .compare(view, user_image, reference_image)
        .await
        .map_err(ViewFailure::Comparator)
}

/// Rounded mean over all six views; views without a score count as zero.
pub fn overall_score(scores: impl IntoIterator<Item = u8>) -> u8 {
    let total: u32 = scores.into_iter().map(|s| u32::from(s.min(MAX_SCORE))).sum();
    let mean = f64::from(total) / ViewName::ALL.len() as f64;
    mean.round().min(f64::from(MAX_SCORE)) as u8
}

fn settle(view: ViewName, slot: Result<ViewScore, ViewFailure>, lang: Lang) -> ViewScore {
    let zero = |key: &str| ViewScore {
        score: 0,
        comment: t(lang, key).to_string(),
    };
    match slot {
        Ok(score) => ViewScore {
            score: score.score.min(MAX_SCORE),
            comment: score.comment,
        },
        Err(ViewFailure::Missing) => {
            tracing::warn!("No image pair for the {} view, scoring 0", view.as_str());
            zero("score.view_missing")
        }
        Err(ViewFailure::Comparator(e)) => {
            tracing::warn!("Comparison of the {} view failed, scoring 0: {e}", view.as_str());
            zero("score.view_failed")
        }
        Err(ViewFailure::Panicked) => {
            tracing::error!("Comparator panicked on the {} view, scoring 0", view.as_str());
            zero("score.view_failed")
        }
    }
}

/// Compare the user's views against the reference views and reduce.
/// Always resolves with all six views filled in.
pub async fn aggregate<C: ImageComparator>(
    comparator: &C,
    user: &ViewImages,
    reference: &ViewImages,
    lang: Lang,
) -> ScoreResult {
    let slot = |view| catch_panic(compare_view(comparator, view, user, reference));
    let (top, bottom, left, right, front, back) = tokio::join!(
        slot(ViewName::Top),
        slot(ViewName::Bottom),
        slot(ViewName::Left),
        slot(ViewName::Right),
        slot(ViewName::Front),
        slot(ViewName::Back),
    );

    let views: std::collections::BTreeMap<_, _> = [
        (ViewName::Top, top),
        (ViewName::Bottom, bottom),
        (ViewName::Left, left),
        (ViewName::Right, right),
        (ViewName::Front, front),
        (ViewName::Back, back),
    ]
    .into_iter()
    .map(|(view, slot)| (view, settle(view, slot, lang)))
    .collect();

    let overall = overall_score(views.values().map(|v| v.score));
    tracing::info!("Overall similarity score {overall}");
    ScoreResult {
        views,
        overall_score: overall,
    }
}
