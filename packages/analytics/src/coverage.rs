//! Geographic extent of a sample set.

use geofence_analytics_models::Coverage;
use geofence_spatial::bounding_box;
use geofence_validation_models::LocationSample;

/// Meters per degree used by the planar area estimate.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Bounds, center, and approximate area covered by `samples`.
///
/// The area treats a degree of longitude as long as a degree of latitude,
/// so it overestimates away from the equator.
#[must_use]
pub fn coverage<'a, I>(samples: I) -> Coverage
where
    I: IntoIterator<Item = &'a LocationSample>,
{
    let samples: Vec<&LocationSample> = samples.into_iter().collect();

    let Some(bounds) = bounding_box(samples.iter().map(|s| &s.coordinates)) else {
        return Coverage::default();
    };

    Coverage {
        center: Some(bounds.center()),
        bounds: Some(bounds),
        approx_area_sq_meters: bounds.lat_span()
            * bounds.lon_span()
            * METERS_PER_DEGREE
            * METERS_PER_DEGREE,
        total_points: samples.len(),
    }
}
