//! Paginated resource counting across (profile, region) scopes.
//!
//! Two nested fan-outs: one thread per profile, and inside it one thread
//! per region. Within a scope, pagination is a strictly sequential loop
//! that stops on the first empty cursor or on the first error. Errors are
//! swallowed so one broken region never hides its siblings; the counts
//! gathered before the error are kept, which can under-report.

use log::{debug, trace};
use std::collections::BTreeMap;
use std::thread;

/// Type key used when a resource identifier cannot be parsed.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Resource type → number of resources seen.
pub type ResourceCount = BTreeMap<String, usize>;

/// One (profile, region) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Scope {
    pub profile: String,
    pub region: String,
}

impl Scope {
    pub fn new(profile: &str, region: &str) -> Self {
        Self {
            profile: profile.to_string(),
            region: region.to_string(),
        }
    }
}

/// One page returned by the remote API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Resource identifiers (ARNs) on this page
    pub resources: Vec<String>,
    /// Continuation cursor; `None` or empty means last page
    pub next: Option<String>,
}

/// A remote API that lists resources one page at a time.
pub trait PageSource: Send + Sync {
    fn fetch(&self, scope: &Scope, cursor: Option<&str>) -> anyhow::Result<Page>;
}

/// Derive `service::type` from an ARN.
///
/// `arn:partition:service:region:account:resource`: the service is the third
/// segment and the type is the sixth segment up to its first `/`.
pub fn resource_type(arn: &str) -> String {
    let segments: Vec<&str> = arn.split(':').collect();
    if segments.len() < 6 {
        return UNKNOWN_TYPE.to_string();
    }

    let service = segments[2];
    let resource = segments[5];
    let kind = resource.split_once('/').map_or(resource, |(kind, _)| kind);
    format!("{service}::{kind}")
}

/// Walk every page for one scope and fold the identifiers into counts.
pub fn count_scope(source: &dyn PageSource, scope: &Scope) -> ResourceCount {
    let mut counts = ResourceCount::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = match source.fetch(scope, cursor.as_deref()) {
            Ok(page) => page,
            Err(e) => {
                debug!(
                    "{}/{}: stopping after {pages} page(s): {e:#}",
                    scope.profile, scope.region
                );
                break;
            }
        };
        pages += 1;

        for arn in &page.resources {
            *counts.entry(resource_type(arn)).or_insert(0) += 1;
        }

        match page.next {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => break,
        }
    }

    trace!(
        "{}/{}: {} resource(s) over {pages} page(s)",
        scope.profile,
        scope.region,
        counts.values().sum::<usize>()
    );
    counts
}

/// Counts for one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionReport {
    pub scope: Scope,
    pub counts: ResourceCount,
}

impl RegionReport {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Count every (profile, region) pair concurrently.
///
/// Returns one report per pair, ordered by profile then region as given,
/// including empty ones; use [`populated`] to drop regions with nothing in
/// them.
pub fn count_resources(
    source: &dyn PageSource,
    profiles: &[String],
    regions: &[String],
) -> Vec<RegionReport> {
    thread::scope(|s| {
        let per_profile: Vec<_> = profiles
            .iter()
            .map(|profile| {
                s.spawn(move || {
                    thread::scope(|inner| {
                        let per_region: Vec<_> = regions
                            .iter()
                            .map(|region| {
                                let scope = Scope::new(profile, region);
                                let handle = inner.spawn({
                                    let scope = scope.clone();
                                    move || count_scope(source, &scope)
                                });
                                (scope, handle)
                            })
                            .collect();

                        per_region
                            .into_iter()
                            .map(|(scope, handle)| {
                                let counts = handle.join().unwrap_or_else(|_| {
                                    debug!("{}/{}: counter panicked", scope.profile, scope.region);
                                    ResourceCount::new()
                                });
                                RegionReport { scope, counts }
                            })
                            .collect::<Vec<_>>()
                    })
                })
            })
            .collect();

        per_profile
            .into_iter()
            .zip(profiles)
            .flat_map(|(handle, profile)| {
                handle.join().unwrap_or_else(|_| {
                    debug!("{profile}: profile counter panicked");
                    Vec::new()
                })
            })
            .collect()
    })
}

/// Drop regions that reported no resources.
pub fn populated(reports: Vec<RegionReport>) -> Vec<RegionReport> {
    reports.into_iter().filter(|r| r.total() > 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves a fixed page sequence per region, keyed by cursor.
    #[derive(Default)]
    struct FakePages {
        pages: HashMap<(String, Option<String>), anyhow::Result<Page>>,
        fetches: AtomicUsize,
        seen: Mutex<Vec<Scope>>,
        slow_region: Option<String>,
    }

    impl FakePages {
        fn page(mut self, region: &str, cursor: Option<&str>, arns: &[&str], next: Option<&str>) -> Self {
            self.pages.insert(
                (region.to_string(), cursor.map(str::to_string)),
                Ok(Page {
                    resources: arns.iter().map(|a| (*a).to_string()).collect(),
                    next: next.map(str::to_string),
                }),
            );
            self
        }

        fn error(mut self, region: &str, cursor: Option<&str>) -> Self {
            self.pages.insert(
                (region.to_string(), cursor.map(str::to_string)),
                Err(anyhow::anyhow!("throttled")),
            );
            self
        }
    }

    impl PageSource for FakePages {
        fn fetch(&self, scope: &Scope, cursor: Option<&str>) -> anyhow::Result<Page> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(scope.clone());
            if self.slow_region.as_deref() == Some(scope.region.as_str()) {
                std::thread::sleep(Duration::from_millis(100));
            }
            match self
                .pages
                .get(&(scope.region.clone(), cursor.map(str::to_string)))
            {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(e)) => Err(anyhow::anyhow!("{e}")),
                None => Ok(Page::default()),
            }
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_resource_type_derivation() {
        assert_eq!(resource_type("arn:aws:ec2:us-east-1:123:instance/i-1"), "ec2::instance");
        assert_eq!(resource_type("arn:aws:s3:::my-bucket"), "s3::my-bucket");
        assert_eq!(resource_type("invalid-arn"), "Unknown");
        assert_eq!(resource_type("arn:aws:lambda:us-east-1:123"), "Unknown");
        assert_eq!(
            resource_type("arn:aws:lambda:us-east-1:123:function:handler"),
            "lambda::function"
        );
    }

    #[test]
    fn test_pagination_stops_on_empty_cursor() {
        let source = FakePages::default()
            .page("us-east-1", None, &["arn:aws:ec2:us-east-1:1:instance/i-1"], Some("p2"))
            .page("us-east-1", Some("p2"), &["arn:aws:ec2:us-east-1:1:instance/i-2"], Some(""))
            // Never reached: the empty cursor above ends the walk.
            .page("us-east-1", Some(""), &["arn:aws:ec2:us-east-1:1:volume/v-1"], None);

        let counts = count_scope(&source, &Scope::new("default", "us-east-1"));

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(counts.get("ec2::instance"), Some(&2));
        assert_eq!(counts.get("ec2::volume"), None);
    }

    #[test]
    fn test_pagination_stops_on_absent_cursor() {
        let source = FakePages::default()
            .page("eu-west-1", None, &["arn:aws:s3:::a"], Some("next"))
            .page("eu-west-1", Some("next"), &["arn:aws:s3:::b"], None);

        let counts = count_scope(&source, &Scope::new("default", "eu-west-1"));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(counts.values().sum::<usize>(), 2);
    }

    #[test]
    fn test_mid_pagination_error_keeps_partial_counts() {
        // Known partial-result scenario: the error is swallowed and the
        // second page's resources are never counted.
        let source = FakePages::default()
            .page("us-west-2", None, &["arn:aws:sqs:us-west-2:1:queue-a", "bad"], Some("p2"))
            .error("us-west-2", Some("p2"));

        let counts = count_scope(&source, &Scope::new("default", "us-west-2"));

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(counts.get("sqs::queue-a"), Some(&1));
        assert_eq!(counts.get(UNKNOWN_TYPE), Some(&1));
    }

    #[test]
    fn test_count_resources_orders_and_filters() {
        let source = FakePages {
            slow_region: Some("us-east-1".to_string()),
            ..FakePages::default()
        }
        .page(
            "us-east-1",
            None,
            &[
                "arn:aws:ec2:us-east-1:1:instance/i-1",
                "arn:aws:ec2:us-east-1:1:instance/i-2",
                "arn:aws:s3:::logs",
            ],
            None,
        )
        .error("ap-south-1", None);

        let profiles = strings(&["dev", "prod"]);
        let regions = strings(&["us-east-1", "eu-west-1", "ap-south-1"]);

        let reports = count_resources(&source, &profiles, &regions);
        let scopes: Vec<_> = reports
            .iter()
            .map(|r| (r.scope.profile.as_str(), r.scope.region.as_str()))
            .collect();
        assert_eq!(
            scopes,
            [
                ("dev", "us-east-1"),
                ("dev", "eu-west-1"),
                ("dev", "ap-south-1"),
                ("prod", "us-east-1"),
                ("prod", "eu-west-1"),
                ("prod", "ap-south-1"),
            ]
        );
        assert_eq!(source.seen.lock().unwrap().len(), 6);

        let kept = populated(reports);
        assert_eq!(kept.len(), 2);
        for report in &kept {
            assert_eq!(report.scope.region, "us-east-1");
            assert_eq!(report.total(), 3);
            assert_eq!(report.total(), report.counts.values().sum::<usize>());
            assert_eq!(report.counts.get("ec2::instance"), Some(&2));
            assert_eq!(report.counts.get("s3::logs"), Some(&1));
        }
    }

    #[test]
    fn test_count_resources_no_profiles() {
        let source = FakePages::default();
        let reports = count_resources(&source, &[], &strings(&["us-east-1"]));
        assert!(reports.is_empty());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }
}
