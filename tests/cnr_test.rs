mod common;

use std::sync::atomic::Ordering;

use common::{FakeUpstream, CAPTCHA_ANSWER, KNOWN_CNR};
use ecourts_scraper::models::{CaptchaModule, CaseNumberQuery};
use ecourts_scraper::{AppError, CnrSearch, SessionManager};

#[tokio::test]
async fn test_cnr_listed_today() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());

    let captcha = sessions.issue(CaptchaModule::CaseStatus).await.unwrap();
    let record = CnrSearch::new(&config)
        .lookup(&mut sessions, &captcha, &KNOWN_CNR.to_lowercase(), CAPTCHA_ANSWER)
        .await
        .unwrap();

    assert_eq!(record.case_number, "123/2024");
    assert_eq!(record.case_type.as_deref(), Some("O.S. - Original Suit"));
    assert_eq!(record.petitioner.as_deref(), Some("1) Ravi Kumar"));
    assert_eq!(record.status.as_deref(), Some("Pending"));
    assert!(record.is_listed_today);
    assert!(!record.is_listed_tomorrow);
    assert_eq!(record.serial_number.as_deref(), Some("14"));
}

#[tokio::test]
async fn test_unknown_cnr_is_not_found() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());

    let captcha = sessions.issue(CaptchaModule::CaseStatus).await.unwrap();
    let err = CnrSearch::new(&config)
        .lookup(&mut sessions, &captcha, "KLER019999992020", CAPTCHA_ANSWER)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AppError::CaseNotFound { .. }), "{}", err);
}

#[tokio::test]
async fn test_not_found_with_rotated_token_keeps_session() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());
    let search = CnrSearch::new(&config);

    // the not-found reply carries a fresh app_token, as the portal's do
    let captcha = sessions.issue(CaptchaModule::CaseStatus).await.unwrap();
    let err = search
        .lookup(&mut sessions, &captcha, "KLER019999992020", CAPTCHA_ANSWER)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AppError::CaseNotFound { .. }), "{}", err);
    assert!(!err.is_invalid_captcha());

    // same upstream session answers the next lookup
    let captcha = sessions.issue(CaptchaModule::CaseStatus).await.unwrap();
    let record = search
        .lookup(&mut sessions, &captcha, KNOWN_CNR, CAPTCHA_ANSWER)
        .await
        .unwrap();
    assert_eq!(record.case_number, "123/2024");
    assert_eq!(upstream.state.cookies_issued.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cause_list_captcha_cannot_search_cases() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());

    let captcha = sessions.issue(CaptchaModule::CauseList).await.unwrap();
    let err = CnrSearch::new(&config)
        .lookup(&mut sessions, &captcha, KNOWN_CNR, CAPTCHA_ANSWER)
        .await
        .err()
        .unwrap();
    assert!(err.is_invalid_captcha());
}

#[tokio::test]
async fn test_case_number_search() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());
    let search = CnrSearch::new(&config);

    let mut query = CaseNumberQuery {
        state_code: "4".into(),
        dist_code: "3".into(),
        court_complex_code: "1040003".into(),
        est_code: "null".into(),
        case_type: "12".into(),
        case_number: "123".into(),
        year: "2024".into(),
    };
    let captcha = sessions.issue(CaptchaModule::CaseStatus).await.unwrap();
    let record = search
        .search_case_number(&mut sessions, &captcha, &query, CAPTCHA_ANSWER)
        .await
        .unwrap();
    assert_eq!(record.case_number, "123/2024");

    query.case_number = "999".into();
    let captcha = sessions.issue(CaptchaModule::CaseStatus).await.unwrap();
    let err = search
        .search_case_number(&mut sessions, &captcha, &query, CAPTCHA_ANSWER)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AppError::CaseNotFound { .. }), "{}", err);
}

#[tokio::test]
async fn test_wrong_captcha_on_lookup() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = upstream.config(dir.path());
    let mut sessions = SessionManager::new(config.clone());

    let captcha = sessions.issue(CaptchaModule::CaseStatus).await.unwrap();
    let err = CnrSearch::new(&config)
        .lookup(&mut sessions, &captcha, KNOWN_CNR, "nope")
        .await
        .err()
        .unwrap();
    assert!(err.is_invalid_captcha());
}
