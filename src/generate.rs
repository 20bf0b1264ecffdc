// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Running a resolved plan: guard, backend, assembly.

use crate::assemble;
use crate::backend::CryptoBackend;
use crate::config::Paths;
use crate::error::{Error, Result};
use crate::guard;
use crate::plan::GenerationPlan;
use crate::trust::{get_trust_store, TrustStore};
use std::path::PathBuf;

/// What a successful run produced.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Files written, in the order they were written
    pub written: Vec<PathBuf>,
    /// Non-fatal problems after the artifacts were written
    pub warnings: Vec<String>,
}

/// Writing into the system directories needs root.
fn check_privileges(plan: &GenerationPlan, paths: &Paths, is_root: bool) -> Result<()> {
    if paths.system && plan.well_known && !is_root {
        let dir = if plan.issue_cert {
            paths.certs_dir.clone()
        } else {
            paths.private_dir.clone()
        };
        return Err(Error::NotPrivileged(dir));
    }
    Ok(())
}

/// Execute `plan` with `backend`.
///
/// A backend failure stops the run. Artifacts stored by earlier steps stay on
/// disk.
pub fn generate(
    plan: &GenerationPlan,
    paths: &Paths,
    backend: &dyn CryptoBackend,
) -> Result<GenerationReport> {
    check_privileges(plan, paths, nix::unistd::Uid::effective().is_root())?;
    guard::check(plan)?;

    let trust = (paths.system && plan.well_known).then(get_trust_store);
    run(plan, backend, trust.as_deref())
}

fn run(
    plan: &GenerationPlan,
    backend: &dyn CryptoBackend,
    trust: Option<&dyn TrustStore>,
) -> Result<GenerationReport> {
    let mut report = GenerationReport::default();
    log::debug!("using {} backend", backend.name());

    if plan.issue_cert {
        let template = plan
            .rendered
            .as_ref()
            .ok_or_else(|| Error::Backend("no rendered request template".into()))?;

        let issued = backend.issue_certificate(template, plan.expiry_days)?;
        assemble::store_certificate(plan, &issued)?;
        report.written.push(plan.paths.key.clone());
        report.written.push(plan.paths.cert.clone());

        if let (true, Some(csr_path)) = (plan.emit_csr, &plan.paths.csr) {
            let csr = backend.issue_csr(template, &issued.key_pem)?;
            assemble::store_csr(plan, &csr)?;
            report.written.push(csr_path.clone());
        }
    }

    if plan.generate_dh {
        let params = backend.generate_dh_params(plan.dh_bits)?;
        assemble::store_dh_params(plan, &params)?;
        report.written.push(plan.paths.dh_params.clone());
    }

    report.warnings.extend(assemble::finalize(plan, trust)?);
    if let Some(combined) = &plan.paths.combined {
        report.written.push(combined.clone());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendFailure, BackendResult, IssuedCertificate};
    use crate::host::testing::FixedHost;
    use crate::plan::{resolve, GenerationRequest, Mode};
    use crate::template::RenderedTemplate;
    use std::cell::RefCell;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Backend that returns canned PEM text and records its calls.
    #[derive(Default)]
    struct MockBackend {
        calls: RefCell<Vec<String>>,
        fail_cert: bool,
        fail_dh: bool,
    }

    impl CryptoBackend for MockBackend {
        fn issue_certificate(
            &self,
            template: &RenderedTemplate,
            days: u32,
        ) -> BackendResult<IssuedCertificate> {
            self.calls
                .borrow_mut()
                .push(format!("cert {} {}", template.common_name(), days));
            if self.fail_cert {
                return Err(BackendFailure("req: unable to load config".into()));
            }
            Ok(IssuedCertificate {
                cert_pem: format!("CERT {}\n", template.common_name()),
                key_pem: "KEY\n".into(),
            })
        }

        fn issue_csr(&self, template: &RenderedTemplate, key_pem: &str) -> BackendResult<String> {
            self.calls
                .borrow_mut()
                .push(format!("csr {} {}", template.common_name(), key_pem.trim()));
            Ok("CSR\n".into())
        }

        fn generate_dh_params(&self, bits: u32) -> BackendResult<String> {
            self.calls.borrow_mut().push(format!("dh {}", bits));
            if self.fail_dh {
                return Err(BackendFailure("genpkey: out of entropy".into()));
            }
            Ok(format!("DH {}\n", bits))
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        paths: Paths,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("temp directory should be created");
        let paths = Paths::with_root(dir.path());
        std::fs::create_dir_all(paths.template.parent().expect("template has a parent"))
            .expect("template directory should be created");
        std::fs::write(&paths.template, include_str!("../templates/localcert.cnf"))
            .expect("template should be written");
        Fixture { _dir: dir, paths }
    }

    fn plan_for(fx: &Fixture, mode: Mode, names: &[&str], force: bool) -> GenerationPlan {
        let request = GenerationRequest {
            mode,
            names: names.iter().map(|n| n.to_string()).collect(),
            include_ip: false,
            emit_csr: false,
            force_overwrite: force,
            expiry_days: 90,
            dh_bits: 2048,
            template_path: fx.paths.template.clone(),
            output_override: None,
            cert_name: "ssl-cert-local".into(),
        };
        resolve(&request, &fx.paths, &FixedHost::lan()).expect("plan should resolve")
    }

    fn execute(fx: &Fixture, plan: &GenerationPlan, backend: &MockBackend) -> Result<GenerationReport> {
        generate(plan, &fx.paths, backend)
    }

    fn mode_of(path: &Path) -> u32 {
        std::fs::metadata(path)
            .expect("metadata should be readable")
            .permissions()
            .mode()
            & 0o777
    }

    #[test]
    fn test_default_run_writes_everything() {
        let fx = fixture();
        let plan = plan_for(&fx, Mode::Default, &[], false);
        let backend = MockBackend::default();

        let report = execute(&fx, &plan, &backend).expect("run should succeed");

        assert_eq!(
            *backend.calls.borrow(),
            vec!["cert box.lan.example 90", "dh 2048"]
        );
        let combined = fx.paths.private_dir.join("ssl-cert-local.pem");
        assert_eq!(
            std::fs::read_to_string(&combined).expect("combined PEM should exist"),
            "CERT box.lan.example\nKEY\nDH 2048\n"
        );
        assert_eq!(report.written.len(), 4);
        assert_eq!(report.written.last(), Some(&combined));
        assert_eq!(mode_of(&plan.paths.key), 0o400);
        assert_eq!(mode_of(&plan.paths.cert), 0o644);
    }

    #[test]
    fn test_csr_signed_with_new_key() {
        let fx = fixture();
        let mut plan = plan_for(&fx, Mode::Custom, &["web.example"], false);
        plan.emit_csr = true;
        plan.paths.csr = Some(fx.paths.certs_dir.join("web.example.csr"));
        let backend = MockBackend::default();

        execute(&fx, &plan, &backend).expect("run should succeed");
        assert_eq!(
            *backend.calls.borrow(),
            vec!["cert web.example 90", "csr web.example KEY"]
        );
        assert_eq!(mode_of(&fx.paths.certs_dir.join("web.example.csr")), 0o600);
    }

    #[test]
    fn test_existing_pair_without_force_writes_nothing() {
        let fx = fixture();
        let plan = plan_for(&fx, Mode::Default, &[], false);
        std::fs::create_dir_all(&fx.paths.certs_dir).expect("certs dir");
        std::fs::write(&plan.paths.cert, "old cert").expect("old cert");

        let backend = MockBackend::default();
        let result = execute(&fx, &plan, &backend);

        assert!(matches!(result, Err(Error::WouldOverwrite(_))));
        assert!(backend.calls.borrow().is_empty());
        assert!(!plan.paths.key.exists());
        assert_eq!(
            std::fs::read_to_string(&plan.paths.cert).expect("old cert"),
            "old cert"
        );
    }

    #[test]
    fn test_force_replaces_existing_pair() {
        let fx = fixture();
        execute(
            &fx,
            &plan_for(&fx, Mode::Default, &[], false),
            &MockBackend::default(),
        )
        .expect("first run should succeed");

        let plan = plan_for(&fx, Mode::Default, &[], true);
        execute(&fx, &plan, &MockBackend::default()).expect("forced run should succeed");
        assert_eq!(mode_of(&plan.paths.key), 0o400);
        assert_eq!(mode_of(&plan.paths.dh_params), 0o400);
        assert_eq!(mode_of(&fx.paths.private_dir.join("ssl-cert-local.pem")), 0o400);
    }

    #[test]
    fn test_dh_failure_keeps_certificate() {
        let fx = fixture();
        let plan = plan_for(&fx, Mode::Default, &[], false);
        let backend = MockBackend {
            fail_dh: true,
            ..Default::default()
        };

        match execute(&fx, &plan, &backend) {
            Err(Error::Backend(text)) => assert_eq!(text, "genpkey: out of entropy"),
            other => panic!("expected Backend error, got {:?}", other),
        }
        assert_eq!(mode_of(&plan.paths.cert), 0o644);
        assert_eq!(mode_of(&plan.paths.key), 0o400);
        assert!(!plan.paths.dh_params.exists());
        assert!(!fx.paths.private_dir.join("ssl-cert-local.pem").exists());
    }

    #[test]
    fn test_cert_failure_stops_run() {
        let fx = fixture();
        let plan = plan_for(&fx, Mode::Default, &[], false);
        let backend = MockBackend {
            fail_cert: true,
            ..Default::default()
        };

        assert!(matches!(
            execute(&fx, &plan, &backend),
            Err(Error::Backend(_))
        ));
        assert_eq!(backend.calls.borrow().len(), 1);
        assert!(!plan.paths.key.exists());
    }

    #[test]
    fn test_dh_params_only_rebuilds_combined() {
        let fx = fixture();
        execute(
            &fx,
            &plan_for(&fx, Mode::Default, &[], false),
            &MockBackend::default(),
        )
        .expect("initial run should succeed");

        let mut plan = plan_for(&fx, Mode::DhParamsOnly, &[], false);
        plan.dh_bits = 4096;
        let backend = MockBackend::default();
        execute(&fx, &plan, &backend).expect("DH-only run should succeed");

        assert_eq!(*backend.calls.borrow(), vec!["dh 4096"]);
        assert_eq!(
            std::fs::read_to_string(fx.paths.private_dir.join("ssl-cert-local.pem"))
                .expect("combined PEM"),
            "CERT box.lan.example\nKEY\nDH 4096\n"
        );
    }

    #[test]
    fn test_dh_params_only_without_pair() {
        let fx = fixture();
        let plan = plan_for(&fx, Mode::DhParamsOnly, &[], false);
        let backend = MockBackend::default();
        assert!(matches!(
            execute(&fx, &plan, &backend),
            Err(Error::MissingPrerequisite(_))
        ));
        assert!(backend.calls.borrow().is_empty());
    }

    #[test]
    fn test_refresh_failure_is_reported() {
        struct BrokenStore;
        impl TrustStore for BrokenStore {
            fn refresh(&self) -> Result<()> {
                Err(Error::TrustStore("no update tool".into()))
            }
            fn name(&self) -> &'static str {
                "broken"
            }
        }

        let fx = fixture();
        let plan = plan_for(&fx, Mode::Custom, &["a.example"], false);
        let report =
            run(&plan, &MockBackend::default(), Some(&BrokenStore)).expect("run should succeed");
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("no update tool"));
        assert!(plan.paths.cert.exists());
    }

    #[test]
    fn test_privilege_check() {
        let fx = fixture();
        let plan = plan_for(&fx, Mode::Custom, &["a.example"], false);
        let system = Paths::with_root(Path::new("/"));

        assert!(matches!(
            check_privileges(&plan, &system, false),
            Err(Error::NotPrivileged(_))
        ));
        check_privileges(&plan, &system, true).expect("root may write system paths");
        // A relocated root never needs privileges
        check_privileges(&plan, &fx.paths, false).expect("prefix root is unprivileged");

        let mut elsewhere = plan.clone();
        elsewhere.well_known = false;
        check_privileges(&elsewhere, &system, false).expect("--out paths are unprivileged");
    }
}
