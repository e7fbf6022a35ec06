use bookdesk_core::db::open_db_in_memory;
use bookdesk_core::{
    ErrorKind, FixedClock, MemberPatch, MembershipError, MembershipService, MembershipTerm,
    NewMember, SqliteMemberRepository,
};
use chrono::NaiveDate;
use rusqlite::Connection;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn service(conn: &Connection) -> MembershipService<SqliteMemberRepository<'_>, FixedClock> {
    MembershipService::new(
        SqliteMemberRepository::try_new(conn).unwrap(),
        FixedClock::at_date(date(2024, 1, 1)),
    )
}

fn new_member(number: &str, term: MembershipTerm) -> NewMember {
    NewMember {
        name: "John Doe".to_string(),
        email: "john@example.com".to_string(),
        phone: "123-456-7890".to_string(),
        address: "123 Main St, Anytown".to_string(),
        membership_number: number.to_string(),
        membership_type: term,
    }
}

#[test]
fn new_member_starts_today_with_term_end_date() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let member = service
        .add_member(new_member("MEM001", MembershipTerm::SixMonths))
        .unwrap();
    assert!(member.active);
    assert_eq!(member.membership_start, date(2024, 1, 1));
    assert_eq!(member.membership_end, date(2024, 6, 29));

    let stored = service.find_member_by_number("MEM001").unwrap().unwrap();
    assert_eq!(stored, member);

    let two_years = service
        .add_member(new_member("MEM002", MembershipTerm::TwoYears))
        .unwrap();
    assert_eq!(two_years.membership_end, date(2025, 12, 31));
}

#[test]
fn duplicate_membership_number_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service
        .add_member(new_member("MEM001", MembershipTerm::OneYear))
        .unwrap();

    let err = service
        .add_member(new_member(" MEM001 ", MembershipTerm::SixMonths))
        .unwrap_err();
    assert!(matches!(err, MembershipError::DuplicateMembershipNumber(ref n) if n == "MEM001"));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(service.list_members().unwrap().len(), 1);
}

#[test]
fn invalid_contact_details_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut bad_email = new_member("MEM001", MembershipTerm::OneYear);
    bad_email.email = "not-an-email".to_string();
    let err = service.add_member(bad_email).unwrap_err();
    assert!(matches!(err, MembershipError::Invalid(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let mut short_phone = new_member("MEM001", MembershipTerm::OneYear);
    short_phone.phone = "555-1234".to_string();
    assert!(matches!(
        service.add_member(short_phone).unwrap_err(),
        MembershipError::Invalid(_)
    ));
    assert!(service.list_members().unwrap().is_empty());
}

#[test]
fn extension_counts_from_current_end_date() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service
        .add_member(new_member("MEM001", MembershipTerm::OneYear))
        .unwrap();

    let extended = service
        .extend_membership("MEM001", MembershipTerm::SixMonths)
        .unwrap();
    assert_eq!(extended.membership_start, date(2024, 1, 1));
    assert_eq!(extended.membership_end, date(2025, 6, 29));
    assert_eq!(extended.membership_type, MembershipTerm::SixMonths);

    let stored = service.find_member_by_number("MEM001").unwrap().unwrap();
    assert_eq!(stored.membership_end, date(2025, 6, 29));
}

#[test]
fn cancellation_keeps_dates_and_extension_keeps_flag() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let member = service
        .add_member(new_member("MEM001", MembershipTerm::SixMonths))
        .unwrap();

    let cancelled = service.cancel_membership("MEM001").unwrap();
    assert!(!cancelled.active);
    assert_eq!(cancelled.membership_end, member.membership_end);

    let extended = service
        .extend_membership("MEM001", MembershipTerm::SixMonths)
        .unwrap();
    assert!(!extended.active);
}

#[test]
fn unknown_membership_number_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.cancel_membership("MEM404").unwrap_err();
    assert!(matches!(err, MembershipError::UnknownMembershipNumber(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(service
        .extend_membership("MEM404", MembershipTerm::OneYear)
        .is_err());
}

#[test]
fn contact_update_leaves_membership_untouched() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let member = service
        .add_member(new_member("MEM001", MembershipTerm::OneYear))
        .unwrap();

    let updated = service
        .update_member(
            member.id,
            MemberPatch {
                address: Some("9 Elm St, Elsewhere".to_string()),
                ..MemberPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.address, "9 Elm St, Elsewhere");
    assert_eq!(updated.membership_end, member.membership_end);

    let stored = service.get_member(member.id).unwrap().unwrap();
    assert_eq!(stored, updated);
}
