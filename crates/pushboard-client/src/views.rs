//! Plain-text rendering of a resolved route.

use std::fmt::Write as _;

use pushboard_shared::format::{format_size, format_upload_time};
use pushboard_shared::{AppId, Environment, Release};

use crate::navigation::RenderedRoute;
use crate::routes::ReleaseDetail;
use crate::widgets::progress::gauge;

const GAUGE_WIDTH: usize = 20;
const RULE: &str = "----------------------------------------";

pub fn render(route: &RenderedRoute) -> String {
    if route.is_not_found() {
        return not_found();
    }

    let mut out = String::new();
    let selected_app = route
        .releases()
        .map(|(app, _)| app)
        .or(route.state.selected_app.as_ref());

    header(&mut out, selected_app, route.state.environment);
    sidebar(&mut out, route.apps(), selected_app);

    if route.is_empty() {
        return out;
    }

    if let Some((app, releases)) = route.releases() {
        let selected = route
            .release_detail()
            .map(|detail| detail.release.release.label.as_str());
        release_list(&mut out, app, route.state.environment, releases, selected);
    }
    if let Some(detail) = route.release_detail() {
        release_detail(&mut out, detail);
    }
    out
}

pub fn not_found() -> String {
    "Page not found\nGo Home: /\n".to_string()
}

pub fn breadcrumb(app: Option<&AppId>) -> String {
    match app {
        Some(app) => format!("Apps \u{203a} {app}"),
        None => "Apps".to_string(),
    }
}

/// `[production] staging` with the active deployment bracketed.
pub fn environment_switcher(current: Environment) -> String {
    Environment::ALL
        .iter()
        .map(|env| {
            if *env == current {
                format!("[{env}]")
            } else {
                env.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn header(out: &mut String, app: Option<&AppId>, env: Environment) {
    let _ = writeln!(
        out,
        "{}  |  {}",
        breadcrumb(app),
        environment_switcher(env)
    );
    let _ = writeln!(out, "{RULE}");
}

fn sidebar(out: &mut String, apps: &[AppId], selected: Option<&AppId>) {
    let _ = writeln!(out, "Apps");
    for app in apps {
        let marker = if Some(app) == selected { ">" } else { " " };
        let _ = writeln!(out, " {marker} {app} ({})", platform(app));
    }
    let _ = writeln!(out);
}

fn platform(app: &AppId) -> &'static str {
    if app.is_ios() {
        "iOS"
    } else {
        "Android"
    }
}

fn release_list(
    out: &mut String,
    app: &AppId,
    env: Environment,
    releases: &[Release],
    selected: Option<&str>,
) {
    let _ = writeln!(out, "Releases of {app} ({env})");
    if releases.is_empty() {
        let _ = writeln!(out, "   no releases");
    }
    for release in releases {
        let marker = if Some(release.label.as_str()) == selected {
            ">"
        } else {
            " "
        };
        let mut flags = Vec::new();
        if release.is_mandatory {
            flags.push("mandatory");
        }
        if release.is_disabled {
            flags.push("disabled");
        }
        if release.is_promotion() {
            flags.push("promoted");
        }
        let _ = writeln!(
            out,
            " {marker} {:<10} {}  rollout {:>3}%  {}",
            release.label,
            format_upload_time(release.upload_time),
            release.rollout,
            flags.join(", ")
        );
    }
    let _ = writeln!(out);
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn release_detail(out: &mut String, detail: &ReleaseDetail) {
    let release = &detail.release.release;

    let _ = writeln!(out, "Release {} ({})", release.label, detail.environment);
    let _ = writeln!(out, "  Target binary  {}", release.target_binary_range);
    let _ = writeln!(out, "  Uploaded       {}", format_upload_time(release.upload_time));
    let _ = writeln!(out, "  Size           {}", format_size(release.size));
    let _ = writeln!(out, "  Released by    {}", release.released_by);
    let _ = writeln!(out, "  Method         {}", release.release_method);
    let _ = writeln!(out, "  Mandatory      {}", yes_no(release.is_mandatory));
    let _ = writeln!(out, "  Disabled       {}", yes_no(release.is_disabled));
    let _ = writeln!(
        out,
        "  Rollout        {}",
        gauge(f64::from(release.rollout), GAUGE_WIDTH)
    );

    match &detail.release.metrics {
        Some(metrics) => {
            let _ = writeln!(
                out,
                "  Active         {}  ({} of {} installs)",
                gauge(metrics.active_percentage(), GAUGE_WIDTH),
                metrics.active,
                metrics.installed
            );
            let _ = writeln!(out, "  Downloaded     {}", metrics.downloaded);
            let _ = writeln!(out, "  Rollbacks      {}", metrics.failed);
        }
        None => {
            let _ = writeln!(out, "  Active         no metrics yet");
        }
    }

    if !release.diff_package_map.is_empty() {
        let _ = writeln!(out, "  Diff packages");
        for (hash, diff) in &release.diff_package_map {
            let _ = writeln!(out, "    from {hash}  {}", format_size(diff.size));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pushboard_shared::{DiffPackage, Metrics, ReleaseWithMetrics};

    use super::*;
    use crate::navigation::Layer;
    use crate::router::{Location, Params};
    use crate::routes::{RouteData, RouteId};
    use crate::state::ConsoleState;
    use crate::testing::release;

    fn route(path: &str, layers: Vec<Layer>) -> RenderedRoute {
        RenderedRoute {
            location: Location::parse(path),
            params: Params::new(),
            state: ConsoleState::default(),
            layers,
            generation: 1,
        }
    }

    fn layout(apps: &[&str]) -> Layer {
        Layer {
            route: RouteId::Layout,
            data: RouteData::Layout {
                apps: apps.iter().map(|a| AppId::from(*a)).collect(),
            },
        }
    }

    #[test]
    fn test_not_found_page() {
        let text = render(&route("/nope", Vec::new()));
        assert_eq!(text, "Page not found\nGo Home: /\n");
    }

    #[test]
    fn test_placeholder_renders_no_content() {
        let text = render(&route(
            "/",
            vec![
                layout(&[]),
                Layer {
                    route: RouteId::Index,
                    data: RouteData::Empty,
                },
            ],
        ));
        assert!(text.starts_with("Apps  |  [production] staging\n"));
        assert!(!text.contains("Release"));
    }

    #[test]
    fn test_release_page() {
        let mut r2 = release("r2", 200);
        r2.is_mandatory = true;
        r2.release_method = "Promote".to_string();
        r2.rollout = 50;
        r2.diff_package_map = BTreeMap::from([(
            "hash-r1".to_string(),
            DiffPackage {
                size: 2048,
                url: "https://blobs/diff".to_string(),
            },
        )]);
        let app = AppId::from("A");

        let text = render(&route(
            "/apps/A/releases/r2",
            vec![
                layout(&["A", "B"]),
                Layer {
                    route: RouteId::App,
                    data: RouteData::App {
                        app: app.clone(),
                        releases: vec![r2.clone(), release("r1", 100)],
                    },
                },
                Layer {
                    route: RouteId::Release,
                    data: RouteData::Release(ReleaseDetail {
                        app,
                        environment: Environment::Production,
                        release: ReleaseWithMetrics {
                            release: r2,
                            metrics: Some(Metrics {
                                label: "r2".to_string(),
                                active: 1,
                                installed: 4,
                                downloaded: 6,
                                failed: 2,
                            }),
                        },
                    }),
                },
            ],
        ));

        assert!(text.starts_with("Apps \u{203a} A  |  [production] staging\n"));
        assert!(text.contains(" > A (Android)\n   B (Android)\n"));
        assert!(text.contains(" > r2 "));
        assert!(text.contains("mandatory, promoted"));
        assert!(text.find(" > r2 ").unwrap() < text.find("   r1 ").unwrap());
        assert!(text.contains("  Rollout        [##########----------]  50%"));
        assert!(text.contains("  Active         [#####---------------]  25%  (1 of 4 installs)"));
        assert!(text.contains("  Rollbacks      2"));
        assert!(text.contains("    from hash-r1  2.00 KB"));
    }

    #[test]
    fn test_sidebar_platform_tags() {
        let text = render(&route("/", vec![layout(&["Turneo-iOS", "Turneo-Android"])]));
        assert!(text.contains("   Turneo-iOS (iOS)\n"));
        assert!(text.contains("   Turneo-Android (Android)\n"));
    }

    #[test]
    fn test_environment_switcher() {
        assert_eq!(
            environment_switcher(Environment::Staging),
            "production [staging]"
        );
        assert_eq!(breadcrumb(None), "Apps");
    }
}
