use docfacade::{
    memory::{MemoryConnector, MemoryEngine},
    prelude::*,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    name: String,
    age: i32,
}

impl Person {
    fn new(name: &str, age: i32) -> Self {
        Self {
            name: name.to_string(),
            age,
        }
    }
}

fn people() -> Vec<Person> {
    vec![
        Person::new("Subrato", 30),
        Person::new("Shekhar", 25),
        Person::new("Priya", 22),
        Person::new("Anika", 30),
        Person::new("Rahul", 41),
        Person::new("Meera", 25),
        Person::new("Dev", 19),
        Person::new("Ishaan", 41),
        Person::new("Kavya", 33),
        Person::new("Nikhil", 28),
        Person::new("Tara", 30),
        Person::new("Arjun", 22),
        Person::new("Zoya", 36),
        Person::new("Vikram", 28),
        Person::new("Leela", 19),
    ]
}

async fn connect() -> Client<MemoryEngine> {
    Client::connect(MemoryConnector::new()).await.unwrap()
}

#[tokio::test]
async fn find_orders_by_every_key_then_limits() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    users.insert_many(&people()).await.unwrap();

    let found: Vec<Person> = users
        .find(
            &FindOptions::builder()
                .sort_by(Desc::new("age"))
                .sort_by(Asc::new("name"))
                .limit(10)
                .build(),
        )
        .await
        .unwrap();

    let mut expected = people();
    expected.sort_by(|a, b| b.age.cmp(&a.age).then_with(|| a.name.cmp(&b.name)));
    expected.truncate(10);

    assert_eq!(found, expected);
    assert_eq!(found[0], Person::new("Ishaan", 41));
    assert_eq!(found[1], Person::new("Rahul", 41));
}

#[tokio::test]
async fn zero_limit_means_no_limit() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    users.insert_many(&people()).await.unwrap();

    let all: Vec<Person> = users
        .find(&FindOptions::builder().limit(0).build())
        .await
        .unwrap();

    assert_eq!(all, people());
}

#[tokio::test]
async fn negative_limit_is_rejected() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    let err = users
        .find::<Person>(&FindOptions::builder().limit(-1).build())
        .await
        .unwrap_err();

    assert!(matches!(err, FacadeError::InvalidOptions(_)));
}

#[tokio::test]
async fn empty_find_is_not_an_error() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    let mut found = vec![Person::new("Existing", 1)];
    let appended = users
        .find_into(&FindOptions::with_filter(doc! { "age": { "$gt": 100 } }), &mut found)
        .await
        .unwrap();

    assert_eq!(appended, 0);
    assert_eq!(found, vec![Person::new("Existing", 1)]);
}

#[tokio::test]
async fn missing_document_is_not_found_and_destination_is_kept() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    users.insert_one(&Person::new("Subrato", 30)).await.unwrap();

    let mut destination = Person::new("Untouched", 0);
    let err = users
        .find_one_into(&FindOneOptions::with_filter(doc! { "_id": ObjectId::new() }), &mut destination)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(destination, Person::new("Untouched", 0));
}

#[tokio::test]
async fn find_one_respects_sort() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    users.insert_many(&people()).await.unwrap();

    let youngest: Person = users
        .find_one(&FindOneOptions::builder().sort_by(Asc::new("age")).sort_by(Desc::new("name")).build())
        .await
        .unwrap();

    assert_eq!(youngest, Person::new("Leela", 19));
}

#[tokio::test]
async fn malformed_document_is_a_decode_error() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    users.insert_one(&Person::new("Subrato", 30)).await.unwrap();
    users.insert_one(&doc! { "name": "Broken", "age": "old" }).await.unwrap();

    let mut found: Vec<Person> = Vec::new();
    let err = users.find_into(&FindOptions::new(), &mut found).await.unwrap_err();

    assert!(err.is_decode());
    assert!(found.is_empty());

    let err = users
        .find_one::<Person>(&FindOneOptions::with_filter(doc! { "name": "Broken" }))
        .await
        .unwrap_err();

    assert!(err.is_decode());
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn insert_many_returns_ids_in_input_order() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    let ids = users.insert_many(&people()).await.unwrap();

    assert_eq!(ids.len(), 15);

    for (id, person) in ids.iter().zip(people()) {
        assert_eq!(id.len(), 24);

        let stored: Person = users
            .find_one(&FindOneOptions::with_filter(doc! { "_id": ObjectId::parse_str(id).unwrap() }))
            .await
            .unwrap();

        assert_eq!(stored, person);
    }
}

#[tokio::test]
async fn empty_batch_inserts_nothing() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    let ids = users.insert_many::<Person>(&[]).await.unwrap();

    assert!(ids.is_empty());
    assert!(db.list_collection_names().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_queries_surface_as_submission_errors() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    users.insert_many(&people()).await.unwrap();

    let err = users
        .find::<Person>(&FindOptions::with_filter(doc! { "age": { "$near": 30 } }))
        .await
        .unwrap_err();
    assert!(matches!(err, FacadeError::QuerySubmission(_)));

    let err = users
        .find_one::<Person>(&FindOneOptions::with_filter(doc! { "$where": "true" }))
        .await
        .unwrap_err();
    assert!(matches!(err, FacadeError::QuerySubmission(_)));

    let err = users
        .aggregate::<Document>(vec![doc! { "$group": { "_id": "$age" } }], doc! {})
        .await
        .unwrap_err();
    assert!(matches!(err, FacadeError::QuerySubmission(_)));
}

#[tokio::test]
async fn custom_id_is_stored_but_not_extracted() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    let err = users
        .insert_one(&doc! { "_id": "user-1", "name": "Subrato", "age": 30 })
        .await
        .unwrap_err();

    assert!(matches!(err, FacadeError::IdentifierExtraction(_)));
    assert_eq!(users.count_documents(doc! { "_id": "user-1" }).await.unwrap(), 1);
}

#[tokio::test]
async fn one_custom_id_fails_the_whole_batch() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    let batch = vec![
        doc! { "name": "a" },
        doc! { "name": "b" },
        doc! { "_id": 3, "name": "c" },
        doc! { "name": "d" },
        doc! { "name": "e" },
    ];

    let err = users.insert_many(&batch).await.unwrap_err();

    match err {
        FacadeError::IdentifierExtraction(reason) => assert!(reason.starts_with("document 2:")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(users.estimated_document_count().await.unwrap(), 5);
}

#[tokio::test]
async fn writes_by_id_and_filter() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    let id = users.insert_one(&Person::new("Subrato", 30)).await.unwrap();
    let oid = ObjectId::parse_str(&id).unwrap();

    let outcome = users.update_by_id(oid, doc! { "$inc": { "age": 1 } }).await.unwrap();
    assert_eq!((outcome.matched_count, outcome.modified_count), (1, 1));

    users
        .replace_one(doc! { "_id": oid }, &Person::new("Subrato Das", 31))
        .await
        .unwrap();

    let stored: Person = users
        .find_one(&FindOneOptions::with_filter(doc! { "_id": oid }))
        .await
        .unwrap();
    assert_eq!(stored, Person::new("Subrato Das", 31));

    users
        .find_one_and_update(doc! { "name": "Subrato Das" }, doc! { "$set": { "age": 40 } })
        .await
        .unwrap();

    let err = users
        .find_one_and_update(doc! { "name": "nobody" }, doc! { "$set": { "age": 40 } })
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    users
        .find_one_and_replace(doc! { "_id": oid }, &Person::new("Priya", 22))
        .await
        .unwrap();

    let removed: Person = users.find_one_and_delete(doc! { "_id": oid }).await.unwrap();
    assert_eq!(removed, Person::new("Priya", 22));
    assert_eq!(users.estimated_document_count().await.unwrap(), 0);
}

#[tokio::test]
async fn replacement_with_operators_is_rejected() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    let err = users
        .replace_one(doc! {}, &doc! { "$set": { "age": 1 } })
        .await
        .unwrap_err();

    assert!(matches!(err, FacadeError::Encode(_)));
}

#[tokio::test]
async fn deletes_counts_and_distinct() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    users.insert_many(&people()).await.unwrap();

    assert_eq!(users.count_documents(doc! { "age": 30 }).await.unwrap(), 3);

    let ages = users.distinct("age", doc! { "age": { "$gte": 36 } }).await.unwrap();
    assert_eq!(ages, vec![Bson::Int32(41), Bson::Int32(36)]);

    let outcome = users.delete_one(doc! { "name": "Dev" }).await.unwrap();
    assert_eq!(outcome.deleted_count, 1);

    let outcome = users.delete_many(doc! { "age": { "$lt": 25 } }).await.unwrap();
    assert_eq!(outcome.deleted_count, 3);

    assert_eq!(users.estimated_document_count().await.unwrap(), 11);
}

#[tokio::test]
async fn aggregate_runs_the_pipeline() {
    let client = connect().await;
    let db = client.database("testdb");
    let users = db.collection("users");

    users.insert_many(&people()).await.unwrap();

    let names: Vec<Document> = users
        .aggregate(
            vec![
                doc! { "$match": { "age": 30 } },
                doc! { "$sort": { "name": 1 } },
                doc! { "$project": { "_id": 0, "name": 1 } },
            ],
            doc! {},
        )
        .await
        .unwrap();

    assert_eq!(
        names,
        vec![doc! { "name": "Anika" }, doc! { "name": "Subrato" }, doc! { "name": "Tara" }],
    );
}

#[tokio::test]
async fn database_administration() {
    let client = connect().await;
    let db = client.database("testdb");

    db.create_collection("users").await.unwrap();
    db.collection("audit").insert_one(&doc! { "event": "boot" }).await.unwrap();

    assert_eq!(db.list_collection_names().await.unwrap(), vec!["audit", "users"]);
    assert_eq!(client.list_database_names().await.unwrap(), vec!["testdb"]);

    let reply = db.run_command(doc! { "count": "audit" }).await.unwrap();
    assert_eq!(reply.get_i64("n").unwrap(), 1);

    db.collection("audit").drop().await.unwrap();
    assert_eq!(db.list_collection_names().await.unwrap(), vec!["users"]);

    db.drop().await.unwrap();
    assert!(client.list_database_names().await.unwrap().is_empty());
}

#[tokio::test]
async fn connect_fails_when_engine_is_unreachable() {
    let engine = MemoryEngine::new();
    engine.disconnect().await.unwrap();

    let err = Client::connect(MemoryConnector::with_engine(engine)).await.unwrap_err();

    assert!(matches!(err, FacadeError::Connection(_)));
}

#[tokio::test]
async fn second_disconnect_fails() {
    let engine = MemoryEngine::new();
    let client = Client::connect(MemoryConnector::with_engine(engine.clone())).await.unwrap();

    client.disconnect().await.unwrap();
    assert!(!engine.is_connected());

    let err = client.disconnect().await.unwrap_err();
    assert!(matches!(err, FacadeError::Disconnect(_)));

    let err = client
        .database("testdb")
        .collection("users")
        .find::<Person>(&FindOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FacadeError::Connection(_)));
}
