//! Row types of every table the marketplace reads or writes.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::domain::foundation::{
    CartId, CategoryId, ChatId, InteractionId, MessageId, ProductId, ProfileId, ReportId,
    ReviewId, UserId,
};

crate::row! {
    /// Public profile attached to an auth account.
    pub struct UserProfile in "User_Information" {
        id: ProfileId => Id,
        created_at: DateTime<Utc> => CreatedAt,
        supabase_id: UserId => SupabaseId,
        email: String => Email,
        first_name: Option<String> => FirstName,
        last_name: Option<String> => LastName,
        user_name: Option<String> => UserName,
        profile_image: Option<Value> => ProfileImage,
        /// Average of the reviews written on this user, maintained server-side.
        rating: Option<f64> => Rating,
        is_flagged: bool => IsFlagged,
        flagged_type: Option<String> => FlaggedType,
        is_deleted: bool => IsDeleted,
        deleted_on: Option<DateTime<Utc>> => DeletedOn,
    }
    columns UserProfileColumn;
    patch UserProfilePatch;
}

crate::row! {
    /// A product put up for sale by a seller.
    pub struct Product in "Product_Information" {
        id: ProductId => Id,
        created_at: DateTime<Utc> => CreatedAt,
        user_id: UserId => UserId,
        title: String => Title,
        description: String => Description,
        /// JSON array of relative image paths.
        image: Option<Value> => Image,
        price: f64 => Price,
        stock_count: i64 => StockCount,
        is_listed @ "isListed": bool => IsListed,
        is_deleted @ "isDeleted": bool => IsDeleted,
    }
    columns ProductColumn;
    patch ProductPatch;
}

crate::row! {
    /// A conversation between two users.
    pub struct Chat in "Chats" {
        id: ChatId => Id,
        created_at: DateTime<Utc> => CreatedAt,
        user_id_1: UserId => UserId1,
        user_id_2: UserId => UserId2,
        visible: bool => Visible,
    }
    columns ChatColumn;
    patch ChatPatch;
}

crate::row! {
    pub struct Message in "Messages" {
        id: MessageId => Id,
        created_at: DateTime<Utc> => CreatedAt,
        chat_id: ChatId => ChatId,
        sender_id: UserId => SenderId,
        logged_message: String => LoggedMessage,
        visible: bool => Visible,
    }
    columns MessageColumn;
    patch MessagePatch;
}

crate::row! {
    /// A category tag products can be assigned to.
    pub struct Category in "Category_Tags" {
        id: CategoryId => Id,
        created_at: DateTime<Utc> => CreatedAt,
        name: String => Name,
        description: String => Description,
    }
    columns CategoryColumn;
    patch CategoryPatch;
}

crate::row! {
    /// Assignment of a product to a category.
    pub struct CategorizedProduct in "Category_Assigned_Products" {
        created_at: DateTime<Utc> => CreatedAt,
        category_id: CategoryId => CategoryId,
        product_id: ProductId => ProductId,
    }
    columns CategorizedProductColumn;
    patch CategorizedProductPatch;
}

crate::row! {
    /// Shopping cart owned by one user.
    pub struct CartHeader in "Shopping_Cart" {
        id: CartId => Id,
        created_at: DateTime<Utc> => CreatedAt,
        user_id: UserId => UserId,
    }
    columns CartHeaderColumn;
    patch CartHeaderPatch;
}

crate::row! {
    pub struct CartItem in "Shopping_Cart_Products" {
        created_at: DateTime<Utc> => CreatedAt,
        shopping_cart_id: CartId => ShoppingCartId,
        product_id: ProductId => ProductId,
    }
    columns CartItemColumn;
    patch CartItemPatch;
}

crate::row! {
    /// A rating left by one user on a seller, optionally about one product.
    pub struct Review in "Reviews" {
        id: ReviewId => Id,
        created_at: DateTime<Utc> => CreatedAt,
        created_by_id: UserId => CreatedById,
        created_on_id: UserId => CreatedOnId,
        product_id: Option<ProductId> => ProductId,
        rating: i32 => Rating,
        description: String => Description,
    }
    columns ReviewColumn;
    patch ReviewPatch;
}

crate::row! {
    /// A moderation report filed by one user against another.
    pub struct Report in "Reports" {
        id: ReportId => Id,
        created_at: DateTime<Utc> => CreatedAt,
        created_by_id: UserId => CreatedById,
        created_on_id: UserId => CreatedOnId,
        description: String => Description,
        linked_information: Option<String> => LinkedInformation,
        is_closed: bool => IsClosed,
        closed_date: Option<NaiveDate> => ClosedDate,
    }
    columns ReportColumn;
    patch ReportPatch;
}

crate::row! {
    /// Block and mute flags between an ordered pair of users.
    ///
    /// `user_1_*` flags are set on `user_id_1` by `user_id_2` and vice versa.
    pub struct Interaction in "User_Interactions" {
        id: InteractionId => Id,
        created_at: DateTime<Utc> => CreatedAt,
        user_id_1: UserId => UserId1,
        user_id_2: UserId => UserId2,
        user_1_is_blocked: bool => User1IsBlocked,
        user_1_is_muted: bool => User1IsMuted,
        user_2_is_blocked: bool => User2IsBlocked,
        user_2_is_muted: bool => User2IsMuted,
    }
    columns InteractionColumn;
    patch InteractionPatch;
}

impl Chat {
    /// Returns the participant that is not `user`.
    pub fn peer_of(&self, user: &UserId) -> UserId {
        if &self.user_id_1 == user {
            self.user_id_2
        } else {
            self.user_id_1
        }
    }
}

impl Interaction {
    /// True if either side has blocked the other.
    pub fn is_blocked(&self) -> bool {
        self.user_1_is_blocked || self.user_2_is_blocked
    }

    /// Flag holding the block set on `target`.
    pub fn block_flag_for(&self, target: &UserId) -> InteractionFlag {
        if &self.user_id_1 == target {
            InteractionFlag::User1Blocked
        } else {
            InteractionFlag::User2Blocked
        }
    }

    /// Flag holding the mute set on `target`.
    pub fn mute_flag_for(&self, target: &UserId) -> InteractionFlag {
        if &self.user_id_1 == target {
            InteractionFlag::User1Muted
        } else {
            InteractionFlag::User2Muted
        }
    }
}

/// One side's block or mute flag on an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionFlag {
    User1Blocked,
    User2Blocked,
    User1Muted,
    User2Muted,
}

impl InteractionFlag {
    pub fn column(self) -> InteractionColumn {
        match self {
            InteractionFlag::User1Blocked => InteractionColumn::User1IsBlocked,
            InteractionFlag::User2Blocked => InteractionColumn::User2IsBlocked,
            InteractionFlag::User1Muted => InteractionColumn::User1IsMuted,
            InteractionFlag::User2Muted => InteractionColumn::User2IsMuted,
        }
    }

    /// Update body setting only this flag.
    pub fn patch(self, value: bool) -> InteractionPatch {
        let mut patch = InteractionPatch::default();
        match self {
            InteractionFlag::User1Blocked => patch.user_1_is_blocked = Some(value),
            InteractionFlag::User2Blocked => patch.user_2_is_blocked = Some(value),
            InteractionFlag::User1Muted => patch.user_1_is_muted = Some(value),
            InteractionFlag::User2Muted => patch.user_2_is_muted = Some(value),
        }
        patch
    }
}
