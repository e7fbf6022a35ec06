use bookdesk_core::db::open_db_in_memory;
use bookdesk_core::{
    BookId, BookPatch, BookSearchQuery, CatalogError, CatalogService, CirculationPolicy, Clock,
    CirculationService, ErrorKind, FixedClock, MediaKind, MembershipService, NewBook, NewMember,
    MembershipTerm, SqliteBookRepository, SqliteIssueRepository, SqliteMemberRepository,
};
use chrono::{Days, NaiveDate};
use rusqlite::Connection;
use uuid::Uuid;

fn clock() -> FixedClock {
    FixedClock::at_date(NaiveDate::from_ymd_opt(2025, 2, 3).unwrap())
}

fn catalog(conn: &Connection) -> CatalogService<SqliteBookRepository<'_>, FixedClock> {
    CatalogService::new(SqliteBookRepository::try_new(conn).unwrap(), clock())
}

fn new_book(kind: MediaKind, title: &str, author: &str, serial: &str, category: &str) -> NewBook {
    NewBook {
        kind,
        title: title.to_string(),
        author: author.to_string(),
        serial_number: serial.to_string(),
        category: category.to_string(),
    }
}

fn stock(service: &CatalogService<SqliteBookRepository<'_>, FixedClock>) {
    for input in [
        new_book(MediaKind::Book, "To Kill a Mockingbird", "Harper Lee", "BK001", "Fiction"),
        new_book(MediaKind::Book, "1984", "George Orwell", "BK002", "Science Fiction"),
        new_book(MediaKind::Movie, "The Shawshank Redemption", "Frank Darabont", "MV001", "Drama"),
        new_book(MediaKind::Book, "Animal Farm", "George Orwell", "BK005", "Fiction"),
    ] {
        service.add_book(input).unwrap();
    }
}

fn check_out(conn: &Connection, book_id: BookId) {
    let member = MembershipService::new(SqliteMemberRepository::try_new(conn).unwrap(), clock())
        .add_member(NewMember {
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: "123-456-7890".to_string(),
            address: "123 Main St, Anytown".to_string(),
            membership_number: format!("MEM-{book_id}"),
            membership_type: MembershipTerm::SixMonths,
        })
        .unwrap();
    let due = clock().today().checked_add_days(Days::new(3)).unwrap();
    CirculationService::new(
        SqliteIssueRepository::try_new(conn).unwrap(),
        clock(),
        CirculationPolicy::default(),
    )
    .issue_book(book_id, member.id, due, None)
    .unwrap();
}

#[test]
fn added_item_is_available_and_trimmed() {
    let conn = open_db_in_memory().unwrap();
    let service = catalog(&conn);

    let book = service
        .add_book(new_book(
            MediaKind::Movie,
            "  Casablanca ",
            "Michael Curtiz",
            " MV010",
            "Drama",
        ))
        .unwrap();

    assert!(book.available);
    assert_eq!(book.title, "Casablanca");
    assert_eq!(book.serial_number, "MV010");
    assert_eq!(book.added_at, clock().now());

    let stored = service.get_book(book.id).unwrap().unwrap();
    assert_eq!(stored, book);
}

#[test]
fn blank_required_fields_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = catalog(&conn);

    let err = service
        .add_book(new_book(MediaKind::Book, "   ", "Someone", "BK900", "Fiction"))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Invalid(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(service
        .search_books(&BookSearchQuery::default())
        .unwrap()
        .is_empty());
}

#[test]
fn search_filters_combine() {
    let conn = open_db_in_memory().unwrap();
    let service = catalog(&conn);
    stock(&service);

    let orwell = service
        .search_books(&BookSearchQuery {
            author: Some("orwell".to_string()),
            ..BookSearchQuery::default()
        })
        .unwrap();
    let titles: Vec<_> = orwell.iter().map(|book| book.title.as_str()).collect();
    assert_eq!(titles, vec!["1984", "Animal Farm"]);

    let fiction_by_orwell = service
        .search_books(&BookSearchQuery {
            author: Some("ORWELL".to_string()),
            category: Some("Fiction".to_string()),
            ..BookSearchQuery::default()
        })
        .unwrap();
    assert_eq!(fiction_by_orwell.len(), 1);
    assert_eq!(fiction_by_orwell[0].title, "Animal Farm");

    let by_title = service
        .search_books(&BookSearchQuery {
            title: Some("shawshank".to_string()),
            ..BookSearchQuery::default()
        })
        .unwrap();
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].kind, MediaKind::Movie);

    let blank = service
        .search_books(&BookSearchQuery {
            title: Some("  ".to_string()),
            ..BookSearchQuery::default()
        })
        .unwrap();
    assert_eq!(blank.len(), 4);
}

#[test]
fn available_only_hides_issued_items() {
    let conn = open_db_in_memory().unwrap();
    let service = catalog(&conn);
    stock(&service);
    let nineteen_eighty_four = service.find_book_by_title("1984").unwrap().unwrap();
    check_out(&conn, nineteen_eighty_four.id);

    let available = service
        .search_books(&BookSearchQuery {
            available_only: true,
            ..BookSearchQuery::default()
        })
        .unwrap();
    assert_eq!(available.len(), 3);
    assert!(available.iter().all(|book| book.available));
    assert!(available
        .iter()
        .all(|book| book.id != nineteen_eighty_four.id));

    let available_orwell = service
        .search_books(&BookSearchQuery {
            author: Some("Orwell".to_string()),
            available_only: true,
            ..BookSearchQuery::default()
        })
        .unwrap();
    assert_eq!(available_orwell.len(), 1);
    assert_eq!(available_orwell[0].title, "Animal Farm");

    let everything = service.search_books(&BookSearchQuery::default()).unwrap();
    assert_eq!(everything.len(), 4);
}

#[test]
fn text_matching_folds_non_ascii_case() {
    let conn = open_db_in_memory().unwrap();
    let service = catalog(&conn);
    service
        .add_book(new_book(MediaKind::Book, "Les Misérables", "Victor Hugo", "BK200", "Fiction"))
        .unwrap();
    service
        .add_book(new_book(MediaKind::Book, "Thérèse Raquin", "Émile Zola", "BK201", "Fiction"))
        .unwrap();

    let by_title = service
        .search_books(&BookSearchQuery {
            title: Some("MISÉRABLES".to_string()),
            ..BookSearchQuery::default()
        })
        .unwrap();
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].serial_number, "BK200");

    let by_author = service
        .search_books(&BookSearchQuery {
            author: Some("émile".to_string()),
            ..BookSearchQuery::default()
        })
        .unwrap();
    assert_eq!(by_author.len(), 1);
    assert_eq!(by_author[0].title, "Thérèse Raquin");

    let exact = service
        .find_book_by_title(" LES MISÉRABLES ")
        .unwrap()
        .unwrap();
    assert_eq!(exact.serial_number, "BK200");
    assert!(service.find_book_by_title("Les Miserables").unwrap().is_none());
}

#[test]
fn title_lookup_ignores_case_and_whitespace() {
    let conn = open_db_in_memory().unwrap();
    let service = catalog(&conn);
    stock(&service);

    let found = service
        .find_book_by_title("  the SHAWSHANK redemption ")
        .unwrap()
        .unwrap();
    assert_eq!(found.serial_number, "MV001");
    assert!(service.find_book_by_title("Unknown").unwrap().is_none());
    assert!(service.find_book_by_title("").unwrap().is_none());
}

#[test]
fn categories_are_distinct_and_sorted() {
    let conn = open_db_in_memory().unwrap();
    let service = catalog(&conn);
    stock(&service);

    assert_eq!(
        service.list_categories().unwrap(),
        vec!["Drama", "Fiction", "Science Fiction"]
    );
}

#[test]
fn update_changes_fields_but_not_availability() {
    let conn = open_db_in_memory().unwrap();
    let service = catalog(&conn);
    let book = service
        .add_book(new_book(MediaKind::Book, "Dune", "Frank Herbert", "BK100", "Fiction"))
        .unwrap();

    check_out(&conn, book.id);

    let updated = service
        .update_book(
            book.id,
            BookPatch {
                category: Some("Science Fiction".to_string()),
                ..BookPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.category, "Science Fiction");
    assert_eq!(updated.title, "Dune");
    assert!(!updated.available);

    let stored = service.get_book(book.id).unwrap().unwrap();
    assert_eq!(stored.category, "Science Fiction");
    assert!(!stored.available);
}

#[test]
fn updating_missing_item_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = catalog(&conn);
    let missing = Uuid::new_v4();

    let err = service
        .update_book(missing, BookPatch::default())
        .unwrap_err();
    assert!(matches!(err, CatalogError::BookNotFound(id) if id == missing));
    assert_eq!(err.user_message(), "Book not found");
}
