//! CI service detection supplying default job fields.
//!
//! Each setup recognizes one CI environment by its well-known variables.
//! Detection runs before the job is finalized; explicitly configured
//! values always win over detected defaults.

use crate::ports::env::Environment;

/// Default job fields contributed by a detected CI service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDefaults {
    /// CI service name.
    pub service_name: String,
    /// CI job identifier.
    pub service_job_id: Option<String>,
    /// CI build number.
    pub service_build_number: Option<String>,
    /// CI build URL.
    pub service_build_url: Option<String>,
    /// Branch the build ran on.
    pub branch: Option<String>,
    /// Pull request under build, when any.
    pub pull_request: Option<String>,
}

/// Recognizes one CI environment.
pub trait ServiceSetup {
    /// Returns defaults when this service's environment is present.
    fn detect(&self, env: &dyn Environment) -> Option<ServiceDefaults>;
}

/// Travis CI.
pub struct Travis;

impl ServiceSetup for Travis {
    fn detect(&self, env: &dyn Environment) -> Option<ServiceDefaults> {
        if env.var("TRAVIS")? != "true" {
            return None;
        }
        Some(ServiceDefaults {
            service_name: "travis-ci".to_string(),
            service_job_id: env.var("TRAVIS_JOB_ID"),
            service_build_number: env.var("TRAVIS_BUILD_NUMBER"),
            service_build_url: None,
            branch: env.var("TRAVIS_BRANCH"),
            pull_request: env.var("TRAVIS_PULL_REQUEST").filter(|pr| pr != "false"),
        })
    }
}

/// Circle CI.
pub struct Circle;

impl ServiceSetup for Circle {
    fn detect(&self, env: &dyn Environment) -> Option<ServiceDefaults> {
        if env.var("CIRCLECI")? != "true" {
            return None;
        }
        Some(ServiceDefaults {
            service_name: "circleci".to_string(),
            service_job_id: None,
            service_build_number: env.var("CIRCLE_BUILD_NUM"),
            service_build_url: env.var("CIRCLE_BUILD_URL"),
            branch: env.var("CIRCLE_BRANCH"),
            pull_request: env.var("CIRCLE_PR_NUMBER"),
        })
    }
}

/// Jenkins.
pub struct Jenkins;

impl ServiceSetup for Jenkins {
    fn detect(&self, env: &dyn Environment) -> Option<ServiceDefaults> {
        env.var("JENKINS_URL")?;
        Some(ServiceDefaults {
            service_name: "jenkins".to_string(),
            service_job_id: env.var("BUILD_NUMBER"),
            service_build_number: env.var("BUILD_NUMBER"),
            service_build_url: env.var("BUILD_URL"),
            branch: env.var("GIT_BRANCH"),
            pull_request: None,
        })
    }
}

/// Generic CI exposing the `CI_*` convention.
pub struct General;

impl ServiceSetup for General {
    fn detect(&self, env: &dyn Environment) -> Option<ServiceDefaults> {
        let service_name = env.var("CI_NAME")?;
        Some(ServiceDefaults {
            service_name,
            service_job_id: env.var("CI_JOB_ID"),
            service_build_number: env.var("CI_BUILD_NUMBER"),
            service_build_url: env.var("CI_BUILD_URL"),
            branch: env.var("CI_BRANCH"),
            pull_request: env.var("CI_PULL_REQUEST"),
        })
    }
}

/// Runs every known setup in a fixed order; the first match wins.
#[must_use]
pub fn detect_service(env: &dyn Environment) -> Option<ServiceDefaults> {
    let services: [&dyn ServiceSetup; 4] = [&Travis, &Circle, &Jenkins, &General];
    services.iter().find_map(|service| service.detect(env))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapEnvironment(HashMap<String, String>);

    impl MapEnvironment {
        fn of(entries: &[(&str, &str)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            )
        }
    }

    impl Environment for MapEnvironment {
        fn var(&self, key: &str) -> Option<String> {
            self.0.get(key).filter(|v| !v.is_empty()).cloned()
        }
    }

    #[test]
    fn travis_is_detected_with_job_id_and_branch() {
        let env = MapEnvironment::of(&[
            ("TRAVIS", "true"),
            ("TRAVIS_JOB_ID", "1234"),
            ("TRAVIS_BRANCH", "main"),
            ("TRAVIS_PULL_REQUEST", "false"),
        ]);
        let defaults = detect_service(&env).unwrap();
        assert_eq!(defaults.service_name, "travis-ci");
        assert_eq!(defaults.service_job_id.as_deref(), Some("1234"));
        assert_eq!(defaults.branch.as_deref(), Some("main"));
        assert_eq!(defaults.pull_request, None);
    }

    #[test]
    fn travis_pull_request_number_is_kept() {
        let env = MapEnvironment::of(&[("TRAVIS", "true"), ("TRAVIS_PULL_REQUEST", "17")]);
        let defaults = detect_service(&env).unwrap();
        assert_eq!(defaults.pull_request.as_deref(), Some("17"));
    }

    #[test]
    fn first_matching_service_wins() {
        let env = MapEnvironment::of(&[
            ("TRAVIS", "true"),
            ("CI_NAME", "other-ci"),
        ]);
        assert_eq!(detect_service(&env).unwrap().service_name, "travis-ci");
    }

    #[test]
    fn general_fallback_uses_ci_variables() {
        let env = MapEnvironment::of(&[
            ("CI_NAME", "buildbot"),
            ("CI_BUILD_NUMBER", "9"),
            ("CI_BUILD_URL", "https://ci.example.com/9"),
        ]);
        let defaults = detect_service(&env).unwrap();
        assert_eq!(defaults.service_name, "buildbot");
        assert_eq!(defaults.service_build_number.as_deref(), Some("9"));
    }

    #[test]
    fn nothing_detected_outside_ci() {
        let env = MapEnvironment::of(&[]);
        assert_eq!(detect_service(&env), None);
    }

    #[test]
    fn jenkins_requires_only_the_url() {
        let env = MapEnvironment::of(&[
            ("JENKINS_URL", "https://jenkins.example.com"),
            ("BUILD_NUMBER", "77"),
        ]);
        let defaults = detect_service(&env).unwrap();
        assert_eq!(defaults.service_name, "jenkins");
        assert_eq!(defaults.service_build_number.as_deref(), Some("77"));
    }
}
