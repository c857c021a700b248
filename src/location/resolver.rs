// Platform geolocation wrapped as a single-resolution future

use std::time::Duration;
use tokio::sync::oneshot;

use super::{Coordinates, GeolocationError, PositionErrorCode};

/// Options forwarded to the platform position source.
///
/// Defaults request a high-accuracy fresh fix with a 10 second acquisition
/// timeout and no reuse of cached positions.
#[derive(Debug, Clone)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Maximum acceptable age of a cached fix; zero means fresh fix only
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Raw fix as reported by the platform, before range validation
#[derive(Debug, Clone, Copy)]
pub struct RawPosition {
    pub latitude: f64,
    pub longitude: f64,
}

/// Settlement callback handed to the position source. `FnOnce`, so a source
/// cannot settle the same request twice.
pub type PositionCallback = Box<dyn FnOnce(Result<RawPosition, PositionErrorCode>) + Send>;

/// Callback-style platform capability (getCurrentPosition shape).
///
/// Implementations invoke the callback exactly once, with either a fix or
/// one of the closed platform error codes.
pub trait PositionSource: Send + Sync {
    fn request_position(&self, options: &PositionOptions, callback: PositionCallback);
}

/// Acquires the current position as a single asynchronous attempt.
///
/// The resolver never retries and never fabricates a location; fallback
/// substitution is the orchestrator's job.
pub struct LocationResolver {
    source: Option<Box<dyn PositionSource>>,
    options: PositionOptions,
}

impl LocationResolver {
    pub fn new(source: impl PositionSource + 'static) -> Self {
        Self::with_options(source, PositionOptions::default())
    }

    pub fn with_options(source: impl PositionSource + 'static, options: PositionOptions) -> Self {
        Self {
            source: Some(Box::new(source)),
            options,
        }
    }

    /// A resolver on a platform without any position capability; every
    /// `resolve` call reports `Unsupported`.
    pub fn unsupported() -> Self {
        Self {
            source: None,
            options: PositionOptions::default(),
        }
    }

    /// Request a fresh fix from the platform.
    ///
    /// The callback API is bridged through a oneshot channel so the call
    /// settles exactly once. The acquisition timeout is also enforced here:
    /// a source that never invokes its callback still yields `Timeout`.
    pub async fn resolve(&self) -> Result<Coordinates, GeolocationError> {
        let source = match &self.source {
            Some(source) => source,
            None => return Err(GeolocationError::Unsupported),
        };

        let (tx, rx) = oneshot::channel();
        let callback: PositionCallback = Box::new(move |result| {
            // Receiver may already be gone if our timeout guard fired first
            let _ = tx.send(result);
        });

        source.request_position(&self.options, callback);

        match tokio::time::timeout(self.options.timeout, rx).await {
            // Guard elapsed before the source settled
            Err(_) => Err(GeolocationError::Timeout),
            // Source dropped the callback without settling
            Ok(Err(_)) => Err(GeolocationError::PositionUnavailable),
            Ok(Ok(Err(code))) => Err(code.into()),
            Ok(Ok(Ok(raw))) => {
                let coords = Coordinates::new(raw.latitude, raw.longitude)
                    .map_err(|_| GeolocationError::PositionUnavailable)?;
                tracing::debug!(
                    latitude = coords.latitude(),
                    longitude = coords.longitude(),
                    "Acquired position fix"
                );
                Ok(coords)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Source that settles immediately with a fixed result
    struct ImmediateSource(Result<RawPosition, PositionErrorCode>);

    impl PositionSource for ImmediateSource {
        fn request_position(&self, _options: &PositionOptions, callback: PositionCallback) {
            callback(self.0);
        }
    }

    /// Source that holds its callback forever without settling
    struct SilentSource(std::sync::Mutex<Vec<PositionCallback>>);

    impl SilentSource {
        fn new() -> Self {
            Self(std::sync::Mutex::new(Vec::new()))
        }
    }

    impl PositionSource for SilentSource {
        fn request_position(&self, _options: &PositionOptions, callback: PositionCallback) {
            self.0.lock().unwrap().push(callback);
        }
    }

    /// Source that discards its callback without settling
    struct DroppingSource;

    impl PositionSource for DroppingSource {
        fn request_position(&self, _options: &PositionOptions, callback: PositionCallback) {
            drop(callback);
        }
    }

    fn short_options() -> PositionOptions {
        PositionOptions {
            timeout: Duration::from_millis(50),
            ..PositionOptions::default()
        }
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let resolver = LocationResolver::new(ImmediateSource(Ok(RawPosition {
            latitude: 12.5,
            longitude: -70.25,
        })));

        let coords = resolver.resolve().await.unwrap();
        assert_eq!(coords.latitude(), 12.5);
        assert_eq!(coords.longitude(), -70.25);
    }

    #[tokio::test]
    async fn test_resolve_maps_platform_errors() {
        for (code, expected) in [
            (
                PositionErrorCode::PermissionDenied,
                GeolocationError::PermissionDenied,
            ),
            (
                PositionErrorCode::PositionUnavailable,
                GeolocationError::PositionUnavailable,
            ),
            (PositionErrorCode::Timeout, GeolocationError::Timeout),
        ] {
            let resolver = LocationResolver::new(ImmediateSource(Err(code)));
            assert_eq!(resolver.resolve().await.unwrap_err(), expected);
        }
    }

    #[tokio::test]
    async fn test_silent_source_times_out() {
        let resolver = LocationResolver::with_options(SilentSource::new(), short_options());
        assert_eq!(
            resolver.resolve().await.unwrap_err(),
            GeolocationError::Timeout
        );
    }

    #[tokio::test]
    async fn test_dropped_callback_is_unavailable() {
        let resolver = LocationResolver::with_options(DroppingSource, short_options());
        assert_eq!(
            resolver.resolve().await.unwrap_err(),
            GeolocationError::PositionUnavailable
        );
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let resolver = LocationResolver::unsupported();
        assert_eq!(
            resolver.resolve().await.unwrap_err(),
            GeolocationError::Unsupported
        );
    }

    #[tokio::test]
    async fn test_out_of_range_fix_is_unavailable() {
        let resolver = LocationResolver::new(ImmediateSource(Ok(RawPosition {
            latitude: 123.0,
            longitude: 0.0,
        })));
        assert_eq!(
            resolver.resolve().await.unwrap_err(),
            GeolocationError::PositionUnavailable
        );
    }
}
