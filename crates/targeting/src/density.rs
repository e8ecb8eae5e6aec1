//! Screen Density Selection
//!
//! Nearest-density choice as the platform resolves resources: among
//! candidates above the requested density the lowest wins, among those
//! below the highest wins, and scaling down counts twice as good as
//! scaling up when the candidates straddle the request.

/// Density assumed when a device does not report one
pub const DEFAULT_DENSITY_DPI: u32 = 160;

/// Whether `candidate` is a strictly better choice than `other` for a
/// device at `requested` dpi.
pub fn is_better_density(candidate: u32, other: u32, requested: u32) -> bool {
    if candidate == other {
        return false;
    }
    let requested = if requested == 0 { DEFAULT_DENSITY_DPI } else { requested };
    let (high, low, candidate_is_higher) = if candidate > other {
        (candidate, other, true)
    } else {
        (other, candidate, false)
    };

    if requested >= high {
        return candidate_is_higher;
    }
    if low >= requested {
        return !candidate_is_higher;
    }

    let (high, low, requested) = (high as u64, low as u64, requested as u64);
    if (2 * low).saturating_sub(requested) * high > requested * requested {
        !candidate_is_higher
    } else {
        candidate_is_higher
    }
}

/// Best density among `candidates` for `requested`; the first of equal
/// densities wins.
pub fn select_best_density(candidates: impl IntoIterator<Item = u32>, requested: u32) -> Option<u32> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        None => Some(candidate),
        Some(current) if is_better_density(candidate, current, requested) => Some(candidate),
        keep => keep,
    })
}
