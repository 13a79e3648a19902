mod common;

use std::io::{Cursor, Read};
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use common::{FakeUpstream, CAPTCHA_ANSWER, ERRORMSG_EMPTY_COURT};
use tokio_test::assert_ok;
use ecourts_scraper::models::{CaptchaModule, CaseKind, CauseListQuery, CourtCode, WireDate};
use ecourts_scraper::render::PdfEngine;
use ecourts_scraper::services::{cause_list_stats, ArtifactWriter};
use ecourts_scraper::{
    AllCourtsFlow, AllCourtsRequest, AppError, AppResult, CauseListFetcher, DocumentRenderer, SessionManager,
};

fn query(court: &str, answer: &str) -> CauseListQuery {
    CauseListQuery::new(
        "4",
        "3",
        "1040003",
        CourtCode::parse(court).unwrap(),
        WireDate::parse("17-10-2025").unwrap(),
        CaseKind::Civil,
        answer,
        None,
    )
}

#[tokio::test]
async fn test_fetch_parses_sections() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());
    let fetcher = CauseListFetcher::new(&config);

    let captcha = sessions.issue(CaptchaModule::CauseList).await.unwrap();
    let fetched = fetcher
        .fetch(&mut sessions, &captcha, &query("2^7", CAPTCHA_ANSWER))
        .await
        .unwrap();

    let list = &fetched.cause_list;
    assert_eq!(list.total_cases(), 3);
    assert_eq!(list.date().to_string(), "17-10-2025");
    let cases = list.cases();
    assert_eq!(cases[0].case_number, "O.S./12/2024");
    assert_eq!(cases[0].section.as_deref(), Some("Bench A"));
    assert_eq!(cases[1].next_hearing.as_deref(), Some("21-11-2025"));
    assert_eq!(cases[2].section.as_deref(), Some("Bench B"));
    assert_eq!(cases[2].serial_number, "3");

    assert!(dir.path().join("last_causelist.html").exists());
}

#[tokio::test]
async fn test_court_without_cases_is_empty_list() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());

    let captcha = sessions.issue(CaptchaModule::CauseList).await.unwrap();
    let fetched = CauseListFetcher::new(&config)
        .fetch(&mut sessions, &captcha, &query("2^8", CAPTCHA_ANSWER))
        .await
        .unwrap();
    assert!(fetched.cause_list.is_empty());
    assert_eq!(fetched.cause_list.total_cases(), 0);
}

#[tokio::test]
async fn test_no_record_errormsg_with_token_is_empty_list() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());

    let captcha = sessions.issue(CaptchaModule::CauseList).await.unwrap();
    let fetched = CauseListFetcher::new(&config)
        .fetch(&mut sessions, &captcha, &query(ERRORMSG_EMPTY_COURT, CAPTCHA_ANSWER))
        .await
        .unwrap();
    assert!(fetched.cause_list.is_empty());
    // one rotation retry, then the message is taken as the answer
    assert_eq!(upstream.state.submits.load(Ordering::SeqCst), 2);

    sessions.issue(CaptchaModule::CauseList).await.unwrap();
    assert_eq!(upstream.state.cookies_issued.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_case_status_captcha_cannot_fetch_cause_list() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());

    let captcha = sessions.issue(CaptchaModule::CaseStatus).await.unwrap();
    let err = CauseListFetcher::new(&config)
        .fetch(&mut sessions, &captcha, &query("2^7", CAPTCHA_ANSWER))
        .await
        .err()
        .unwrap();
    assert!(err.is_invalid_captcha(), "{}", err);

    let flow = AllCourtsFlow::with_parts(
        CauseListFetcher::new(&config),
        DocumentRenderer::with_engines(vec![Box::new(FakePdf)], Duration::from_secs(2), ArtifactWriter::new(&config)),
    );
    let err = flow
        .collect(&mut sessions, &captcha, &all_courts_request(CAPTCHA_ANSWER))
        .await
        .err()
        .unwrap();
    assert!(err.is_invalid_captcha(), "{}", err);
    assert_eq!(upstream.state.submits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_wrong_captcha_kills_session() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());
    let fetcher = CauseListFetcher::new(&config);

    let captcha = sessions.issue(CaptchaModule::CauseList).await.unwrap();
    let err = fetcher
        .fetch(&mut sessions, &captcha, &query("2^7", "wrong"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AppError::InvalidCaptcha { .. }));
    assert_eq!(upstream.state.submits.load(Ordering::SeqCst), 1);

    // the next captcha comes from a fresh upstream session
    let retry = sessions.issue(CaptchaModule::CauseList).await.unwrap();
    assert_eq!(upstream.state.cookies_issued.load(Ordering::SeqCst), 2);
    let fetched = assert_ok!(
        fetcher
            .fetch(&mut sessions, &retry, &query("2^7", CAPTCHA_ANSWER))
            .await
    );
    assert_eq!(fetched.cause_list.total_cases(), 3);
}

#[tokio::test]
async fn test_stats_over_fetched_list() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());

    let captcha = sessions.issue(CaptchaModule::CauseList).await.unwrap();
    let fetched = CauseListFetcher::new(&config)
        .fetch(&mut sessions, &captcha, &query("2^7", CAPTCHA_ANSWER))
        .await
        .unwrap();

    let stats = cause_list_stats(&fetched.cause_list, "2^7");
    assert_eq!(stats.total_cases, 3);
    assert_eq!(stats.purposes.get("Evidence"), 2);
    assert_eq!(stats.purposes.get("Arguments"), 1);
    assert_eq!(stats.purposes.total(), stats.total_cases);
}

struct FakePdf;

#[async_trait]
impl PdfEngine for FakePdf {
    fn name(&self) -> &str {
        "fake"
    }

    async fn render(&self, html: &str) -> AppResult<Vec<u8>> {
        Ok(format!("%PDF-1.4\n{}", html.len()).into_bytes())
    }
}

fn all_courts_request(answer: &str) -> AllCourtsRequest {
    AllCourtsRequest {
        state_code: "4".into(),
        dist_code: "3".into(),
        complex_code: "1040003".into(),
        date: WireDate::parse("17-10-2025").unwrap(),
        case_kind: CaseKind::Civil,
        captcha_answer: answer.into(),
    }
}

#[tokio::test]
async fn test_all_courts_share_one_captcha() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());
    let renderer = DocumentRenderer::with_engines(
        vec![Box::new(FakePdf)],
        Duration::from_secs(2),
        ArtifactWriter::new(&config),
    );
    let flow = AllCourtsFlow::with_parts(CauseListFetcher::new(&config), renderer);

    let captcha = sessions.issue(CaptchaModule::CauseList).await.unwrap();
    let archive = flow
        .run(&mut sessions, &captcha, &all_courts_request(CAPTCHA_ANSWER))
        .await
        .unwrap();
    assert_eq!(upstream.state.submits.load(Ordering::SeqCst), 2);
    assert_eq!(upstream.state.captchas_served.load(Ordering::SeqCst), 1);

    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    assert_eq!(zip.len(), 3);
    let mut manifest = String::new();
    zip.by_name("manifest.json").unwrap().read_to_string(&mut manifest).unwrap();
    let manifest: serde_json::Value = serde_json::from_str(&manifest).unwrap();
    assert_eq!(manifest["rendered"], 2);
    assert_eq!(manifest["courts"][0]["court_code"], "2^7");
    assert_eq!(manifest["courts"][0]["total_cases"], 3);
    assert_eq!(manifest["courts"][1]["total_cases"], 0);
}

#[tokio::test]
async fn test_all_courts_abort_on_wrong_captcha() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());
    let flow = AllCourtsFlow::with_parts(
        CauseListFetcher::new(&config),
        DocumentRenderer::with_engines(vec![Box::new(FakePdf)], Duration::from_secs(2), ArtifactWriter::new(&config)),
    );

    let captcha = sessions.issue(CaptchaModule::CauseList).await.unwrap();
    let err = flow
        .collect(&mut sessions, &captcha, &all_courts_request("wrong"))
        .await
        .err()
        .unwrap();
    assert!(err.is_invalid_captcha());
    assert_eq!(upstream.state.submits.load(Ordering::SeqCst), 1);
}
