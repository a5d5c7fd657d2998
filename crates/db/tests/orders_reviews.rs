//! Integration tests for order and review persistence.

use bistro_core::order::{DeliveryType, OrderLine, OrderStatus, PaymentStatus};
use bistro_core::review::compute_rating_stats;
use bistro_db::models::category::CreateCategory;
use bistro_db::models::item::CreateItem;
use bistro_db::models::order::{CreateOrder, UpdateOrder};
use bistro_db::models::review::CreateReview;
use bistro_db::models::user::CreateUser;
use bistro_db::repositories::{CategoryRepo, ItemRepo, OrderRepo, ReviewRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, email: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: Some("User".to_string()),
            phone_no: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_item(pool: &PgPool, name: &str) -> i64 {
    let category_id = CategoryRepo::create(
        pool,
        &CreateCategory {
            name: format!("{name} category"),
            image_ref: "memory://categories/c.png".to_string(),
        },
    )
    .await
    .unwrap()
    .id;

    let mut conn = pool.acquire().await.unwrap();
    ItemRepo::create(
        &mut conn,
        &CreateItem {
            name: name.to_string(),
            description: String::new(),
            image_ref: "memory://items/i.png".to_string(),
            price: 5.0,
            category_id,
            sizes: Vec::new(),
            temperatures: Vec::new(),
            addons: Vec::new(),
            featured: None,
            is_deal: false,
            item_type: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn line(item_id: i64, quantity: i32) -> OrderLine {
    OrderLine {
        item_id,
        quantity,
        size: None,
        temperature: None,
        addons: Vec::new(),
        special_instructions: String::new(),
    }
}

async fn place_order(pool: &PgPool, user_id: i64, lines: Vec<OrderLine>) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    OrderRepo::create(
        &mut conn,
        &CreateOrder {
            user_id,
            line_items: lines,
            total_price: 12.0,
            delivery_type: DeliveryType::Takeaway,
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_order_starts_pending_and_unpaid(pool: PgPool) {
    let user = seed_user(&pool, "a@example.com").await;
    let item = seed_item(&pool, "Soup").await;
    let id = place_order(&pool, user, vec![line(item, 2)]).await;

    let order = OrderRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending.as_str());
    assert_eq!(order.payment_status, PaymentStatus::Unpaid.as_str());
    assert_eq!(order.delivery_type, "takeaway");
    assert_eq!(order.line_items.0, vec![line(item, 2)]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_applies_status_and_payment_independently(pool: PgPool) {
    let user = seed_user(&pool, "a@example.com").await;
    let item = seed_item(&pool, "Soup").await;
    let id = place_order(&pool, user, vec![line(item, 1)]).await;

    let mut conn = pool.acquire().await.unwrap();
    let paid = UpdateOrder {
        payment_status: Some(PaymentStatus::Paid),
        ..Default::default()
    };
    let order = OrderRepo::update(&mut conn, id, &paid).await.unwrap().unwrap();
    assert_eq!(order.payment_status, "paid");
    assert_eq!(order.status, "pending");

    let accepted = UpdateOrder {
        status: Some(OrderStatus::Accept),
        ..Default::default()
    };
    let order = OrderRepo::update(&mut conn, id, &accepted).await.unwrap().unwrap();
    assert_eq!(order.status, "accept");
    assert_eq!(order.payment_status, "paid");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_by_status(pool: PgPool) {
    let user = seed_user(&pool, "a@example.com").await;
    let item = seed_item(&pool, "Soup").await;
    let first = place_order(&pool, user, vec![line(item, 1)]).await;
    place_order(&pool, user, vec![line(item, 1)]).await;

    let mut conn = pool.acquire().await.unwrap();
    let returned = UpdateOrder {
        status: Some(OrderStatus::Returned),
        ..Default::default()
    };
    OrderRepo::update(&mut conn, first, &returned).await.unwrap();
    drop(conn);

    let all = OrderRepo::list(&pool, None, 50, 0).await.unwrap();
    assert_eq!(all.len(), 2);
    let returned = OrderRepo::list(&pool, Some(OrderStatus::Returned), 50, 0).await.unwrap();
    assert_eq!(returned.len(), 1);
    assert_eq!(returned[0].id, first);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_order_containment_check(pool: PgPool) {
    let buyer = seed_user(&pool, "buyer@example.com").await;
    let other = seed_user(&pool, "other@example.com").await;
    let soup = seed_item(&pool, "Soup").await;
    let salad = seed_item(&pool, "Salad").await;
    place_order(&pool, buyer, vec![line(soup, 1)]).await;

    let mut conn = pool.acquire().await.unwrap();
    assert!(OrderRepo::user_has_ordered_item(&mut conn, buyer, soup).await.unwrap());
    assert!(!OrderRepo::user_has_ordered_item(&mut conn, buyer, salad).await.unwrap());
    assert!(!OrderRepo::user_has_ordered_item(&mut conn, other, soup).await.unwrap());
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_review_by_same_user_violates_unique(pool: PgPool) {
    let user = seed_user(&pool, "a@example.com").await;
    let item = seed_item(&pool, "Soup").await;
    let review = CreateReview {
        item_id: item,
        user_id: user,
        rating: 4,
        comment: "Nice".to_string(),
    };

    let mut conn = pool.acquire().await.unwrap();
    ReviewRepo::create(&mut conn, &review).await.unwrap();
    assert!(ReviewRepo::exists_for_user(&mut conn, item, user).await.unwrap());

    let err = ReviewRepo::create(&mut conn, &review).await.unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("uq_item_reviews_item_user"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rating_stats_round_trip(pool: PgPool) {
    let item = seed_item(&pool, "Soup").await;
    let mut conn = pool.acquire().await.unwrap();
    for (i, rating) in [5, 4, 4].into_iter().enumerate() {
        let user = seed_user(&pool, &format!("u{i}@example.com")).await;
        ReviewRepo::create(
            &mut conn,
            &CreateReview {
                item_id: item,
                user_id: user,
                rating,
                comment: String::new(),
            },
        )
        .await
        .unwrap();
    }

    let ratings = ReviewRepo::ratings_for_item(&mut conn, item).await.unwrap();
    let stats = compute_rating_stats(&ratings);
    ItemRepo::set_rating_stats(&mut conn, item, &stats).await.unwrap();
    drop(conn);

    let stored = ItemRepo::find_by_id(&pool, item).await.unwrap().unwrap();
    assert_eq!(stored.review_count, 3);
    assert_eq!(stored.average_rating, 4.3);

    let listed = ReviewRepo::list_for_item(&pool, item, 10, 0).await.unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].item_review_count, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reviews_cascade_with_item(pool: PgPool) {
    let user = seed_user(&pool, "a@example.com").await;
    let item = seed_item(&pool, "Soup").await;
    let mut conn = pool.acquire().await.unwrap();
    ReviewRepo::create(
        &mut conn,
        &CreateReview {
            item_id: item,
            user_id: user,
            rating: 3,
            comment: String::new(),
        },
    )
    .await
    .unwrap();
    drop(conn);

    ItemRepo::delete(&pool, item).await.unwrap();

    let all = ReviewRepo::list_all(&pool, 10, 0).await.unwrap();
    assert!(all.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_review_pages_are_stable_for_equal_timestamps(pool: PgPool) {
    let item = seed_item(&pool, "Soup").await;
    let mut conn = pool.acquire().await.unwrap();
    for i in 0..4 {
        let user = seed_user(&pool, &format!("t{i}@example.com")).await;
        ReviewRepo::create(
            &mut conn,
            &CreateReview {
                item_id: item,
                user_id: user,
                rating: 4,
                comment: String::new(),
            },
        )
        .await
        .unwrap();
    }
    drop(conn);
    sqlx::query("UPDATE item_reviews SET created_at = '2026-01-01T12:00:00Z'")
        .execute(&pool)
        .await
        .unwrap();

    let mut paged = Vec::new();
    for offset in [0, 2] {
        let page = ReviewRepo::list_for_item(&pool, item, 2, offset).await.unwrap();
        paged.extend(page.into_iter().map(|r| r.id));
    }
    let all: Vec<i64> = ReviewRepo::list_all(&pool, 10, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();

    let mut expected = all.clone();
    expected.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(all, expected);
    assert_eq!(paged, expected);
}
