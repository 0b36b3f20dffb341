diesel::table! {
    rooms (id) {
        id -> BigInt,
        room_id -> Text,
        name -> Text,
        kind -> Text,
        owner_id -> Text,
        members -> Text,
        roles -> Text,
        is_private -> Bool,
        allow_files -> Bool,
        allow_calls -> Bool,
        allow_reactions -> Bool,
        status -> Text,
        project_id -> Nullable<Text>,
        created_at -> Timestamptz,
        last_activity_at -> Timestamptz,
    }
}

diesel::table! {
    messages (id) {
        id -> BigInt,
        message_id -> Text,
        room_id -> Text,
        sender_id -> Text,
        kind -> Text,
        body -> Nullable<Text>,
        attachments -> Text,
        reply_to -> Nullable<Text>,
        reactions -> Text,
        read_by -> Text,
        pinned -> Bool,
        created_at -> Timestamptz,
        edited_at -> Nullable<Timestamptz>,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    notifications (id) {
        id -> BigInt,
        notification_id -> Text,
        user_id -> Text,
        source -> Text,
        title -> Text,
        body -> Text,
        read -> Bool,
        priority -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    projects (id) {
        id -> BigInt,
        project_id -> Text,
        owner_id -> Text,
        name -> Text,
        token_symbol -> Text,
        sector -> Text,
        stage -> Text,
        description -> Text,
        website -> Nullable<Text>,
        whitepaper_url -> Nullable<Text>,
        audited -> Bool,
        kyc_verified -> Bool,
        team_public -> Bool,
        target_raise_usd -> BigInt,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(rooms, messages, notifications, projects,);
