#[macro_use]
mod common;

use chatrooms::{
    rooms::{Cursor, Order, Rooms},
    setting::Settings,
};
use common::{ids, picks, room_with_messages};

async fn latest_messages(rooms: Rooms) {
    let (room, messages) = room_with_messages(&rooms).await;

    let page = rooms.messages(&room.id, 5, None).await.unwrap();
    assert_eq!(ids(&page), picks(&messages, &[6, 7, 8, 9, 10]));

    let page = rooms.messages(&room.id, 5, Some(Order::Asc)).await.unwrap();
    assert_eq!(ids(&page), picks(&messages, &[0, 1, 2, 3, 4]));

    let page = rooms.messages(&room.id, 5, Some(Order::Desc)).await.unwrap();
    assert_eq!(ids(&page), picks(&messages, &[10, 9, 8, 7, 6]));
    assert_eq!(page[0].body, "body of message 10");
}

/// (since, until) bounds for messages 3 and 5, one entry per inclusivity
/// combination, with the expected page for each order.
async fn between_both_bounds(rooms: Rooms) {
    let (room, messages) = room_with_messages(&rooms).await;
    let (m3, m5) = (messages[3].id, messages[5].id);

    let cases: [(Cursor, Cursor, &[usize], &[usize]); 4] = [
        (Cursor::inclusive(m3), Cursor::inclusive(m5), &[3, 4], &[5, 4]),
        (Cursor::exclusive(m3), Cursor::inclusive(m5), &[4, 5], &[5, 4]),
        (Cursor::inclusive(m3), Cursor::exclusive(m5), &[3, 4], &[4, 3]),
        (Cursor::exclusive(m3), Cursor::exclusive(m5), &[4], &[4]),
    ];

    for (since, until, ascending, descending) in cases {
        for order in [None, Some(Order::Asc)] {
            let page = rooms
                .messages_between(&room.id, Some(since), Some(until), 2, order)
                .await
                .unwrap();
            assert_eq!(ids(&page), picks(&messages, ascending), "{since:?} {until:?} {order:?}");
        }

        let page = rooms
            .messages_between(&room.id, Some(since), Some(until), 2, Some(Order::Desc))
            .await
            .unwrap();
        assert_eq!(ids(&page), picks(&messages, descending), "{since:?} {until:?} desc");
    }
}

async fn between_without_bounds(rooms: Rooms) {
    let (room, messages) = room_with_messages(&rooms).await;

    for order in [None, Some(Order::Asc)] {
        let page = rooms.messages_between(&room.id, None, None, 2, order).await.unwrap();
        assert_eq!(ids(&page), picks(&messages, &[0, 1]));
    }

    let page = rooms
        .messages_between(&room.id, None, None, 2, Some(Order::Desc))
        .await
        .unwrap();
    assert_eq!(ids(&page), picks(&messages, &[10, 9]));
}

async fn between_since_only(rooms: Rooms) {
    let (room, messages) = room_with_messages(&rooms).await;
    let m5 = messages[5].id;

    for order in [None, Some(Order::Asc)] {
        let page = rooms
            .messages_between(&room.id, Some(Cursor::inclusive(m5)), None, 2, order)
            .await
            .unwrap();
        assert_eq!(ids(&page), picks(&messages, &[5, 6]));

        let page = rooms
            .messages_between(&room.id, Some(Cursor::exclusive(m5)), None, 2, order)
            .await
            .unwrap();
        assert_eq!(ids(&page), picks(&messages, &[6, 7]));
    }

    for since in [Cursor::inclusive(m5), Cursor::exclusive(m5)] {
        let page = rooms
            .messages_between(&room.id, Some(since), None, 2, Some(Order::Desc))
            .await
            .unwrap();
        assert_eq!(ids(&page), picks(&messages, &[10, 9]));
    }
}

async fn between_until_only(rooms: Rooms) {
    let (room, messages) = room_with_messages(&rooms).await;
    let m5 = messages[5].id;

    for order in [None, Some(Order::Desc)] {
        let page = rooms
            .messages_between(&room.id, None, Some(Cursor::inclusive(m5)), 2, order)
            .await
            .unwrap();
        assert_eq!(ids(&page), picks(&messages, &[5, 4]));

        let page = rooms
            .messages_between(&room.id, None, Some(Cursor::exclusive(m5)), 2, order)
            .await
            .unwrap();
        assert_eq!(ids(&page), picks(&messages, &[4, 3]));
    }

    let page = rooms
        .messages_between(&room.id, None, Some(Cursor::inclusive(m5)), 2, Some(Order::Asc))
        .await
        .unwrap();
    assert_eq!(ids(&page), picks(&messages, &[4, 5]));

    let page = rooms
        .messages_between(&room.id, None, Some(Cursor::exclusive(m5)), 2, Some(Order::Asc))
        .await
        .unwrap();
    assert_eq!(ids(&page), picks(&messages, &[3, 4]));
}

async fn short_and_empty_pages(rooms: Rooms) {
    let (room, messages) = room_with_messages(&rooms).await;
    let (m3, m9) = (messages[3].id, messages[9].id);

    // fewer messages than the limit
    let page = rooms.messages(&room.id, 50, Some(Order::Asc)).await.unwrap();
    assert_eq!(page.len(), 11);

    let page = rooms.messages(&room.id, 0, None).await.unwrap();
    assert!(page.is_empty());

    // inverted range
    let page = rooms
        .messages_between(&room.id, Some(Cursor::inclusive(m9)), Some(Cursor::inclusive(m3)), 5, None)
        .await
        .unwrap();
    assert!(page.is_empty());

    // same message, exclusive on one side
    let page = rooms
        .messages_between(&room.id, Some(Cursor::inclusive(m3)), Some(Cursor::exclusive(m3)), 5, None)
        .await
        .unwrap();
    assert!(page.is_empty());

    let page = rooms
        .messages_between(&room.id, Some(Cursor::inclusive(m3)), Some(Cursor::inclusive(m3)), 5, None)
        .await
        .unwrap();
    assert_eq!(ids(&page), picks(&messages, &[3]));
}

async fn unknown_room_has_no_messages(rooms: Rooms) {
    let (_room, _messages) = room_with_messages(&rooms).await;
    let elsewhere = chatrooms::id::RoomId::new();

    assert!(rooms.messages(&elsewhere, 5, None).await.unwrap().is_empty());
    assert!(rooms
        .messages_between(&elsewhere, None, None, 5, Some(Order::Desc))
        .await
        .unwrap()
        .is_empty());
}

async fn rooms_do_not_share_messages(rooms: Rooms) {
    let (first, first_messages) = room_with_messages(&rooms).await;
    let second = common::open(&rooms, chatrooms::rooms::NewRoom::titled("room2"), None).await;
    let posted = rooms
        .post_message(&second.id, "hello", time::OffsetDateTime::now_utc())
        .await
        .unwrap();

    let page = rooms.messages(&second.id, 5, None).await.unwrap();
    assert_eq!(ids(&page), vec![posted.id]);

    let page = rooms.messages(&first.id, 20, Some(Order::Asc)).await.unwrap();
    assert_eq!(ids(&page), ids(&first_messages));
}

with_each_store!(
    latest_messages,
    between_both_bounds,
    between_without_bounds,
    between_since_only,
    between_until_only,
    short_and_empty_pages,
    unknown_room_has_no_messages,
    rooms_do_not_share_messages,
);

fn small_pages() -> Settings {
    let mut settings = Settings::default();
    settings.max_page_size = 3;
    settings
}

async fn limit_is_capped_by_max_page_size(rooms: Rooms) {
    let (room, messages) = room_with_messages(&rooms).await;

    let page = rooms.messages(&room.id, 5, Some(Order::Asc)).await.unwrap();
    assert_eq!(ids(&page), picks(&messages, &[0, 1, 2]));

    let page = rooms.messages(&room.id, 5, None).await.unwrap();
    assert_eq!(ids(&page), picks(&messages, &[8, 9, 10]));

    let page = rooms
        .messages_between(&room.id, Some(Cursor::exclusive(messages[2].id)), None, 5, None)
        .await
        .unwrap();
    assert_eq!(ids(&page), picks(&messages, &[3, 4, 5]));
}

#[tokio::test]
async fn memory_limit_is_capped_by_max_page_size() {
    limit_is_capped_by_max_page_size(common::memory_rooms_with(small_pages())).await;
}

#[tokio::test]
async fn sqlite_limit_is_capped_by_max_page_size() {
    limit_is_capped_by_max_page_size(common::sqlite_rooms_with(small_pages()).await).await;
}
