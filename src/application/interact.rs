//! Interact - block and mute flags between pairs of users.

use crate::application::client::DataClient;
use crate::domain::foundation::{DataResult, UserId, ValidationError};
use crate::domain::query::Filter;
use crate::domain::schema::{Interaction, InteractionColumn, InteractionFlag, InteractionPatch};

fn involving(user: UserId) -> Filter {
    Filter::or([
        Filter::eq(InteractionColumn::UserId1, user),
        Filter::eq(InteractionColumn::UserId2, user),
    ])
}

/// Interaction records between users.
#[derive(Clone)]
pub struct Interactions {
    client: DataClient,
}

impl Interactions {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }

    /// The record between `a` and `b`, whichever order it was created in.
    pub async fn between(&self, a: UserId, b: UserId) -> DataResult<Interaction> {
        self.client
            .from::<Interaction>()
            .select::<Interaction>()
            .or([
                Filter::and([
                    Filter::eq(InteractionColumn::UserId1, a),
                    Filter::eq(InteractionColumn::UserId2, b),
                ]),
                Filter::and([
                    Filter::eq(InteractionColumn::UserId1, b),
                    Filter::eq(InteractionColumn::UserId2, a),
                ]),
            ])
            .one()
            .await
    }

    /// Records involving `user` where either side is blocked.
    pub async fn blocked_involving(&self, user: UserId) -> DataResult<Vec<Interaction>> {
        self.flagged_involving(user, InteractionFlag::User1Blocked, InteractionFlag::User2Blocked)
            .await
    }

    /// Records involving `user` where either side is muted.
    pub async fn muted_involving(&self, user: UserId) -> DataResult<Vec<Interaction>> {
        self.flagged_involving(user, InteractionFlag::User1Muted, InteractionFlag::User2Muted)
            .await
    }

    async fn flagged_involving(
        &self,
        user: UserId,
        first: InteractionFlag,
        second: InteractionFlag,
    ) -> DataResult<Vec<Interaction>> {
        let flagged = Filter::or([
            Filter::eq(first.column(), true),
            Filter::eq(second.column(), true),
        ]);
        self.client
            .from::<Interaction>()
            .select::<Interaction>()
            .filter(Filter::and([involving(user), flagged]))
            .many()
            .await
    }

    pub async fn create(&self, a: UserId, b: UserId) -> DataResult<Interaction> {
        if a == b {
            return Err(ValidationError::invalid_format("user_id_2", "cannot interact with yourself").into());
        }
        let patch = InteractionPatch {
            user_id_1: Some(a),
            user_id_2: Some(b),
            ..Default::default()
        };
        self.client
            .from::<Interaction>()
            .insert(&patch)?
            .one()
            .await
    }

    /// Sets or clears the block `blocker` holds on `target`.
    pub async fn block(&self, blocker: UserId, target: UserId, blocked: bool) -> DataResult<Interaction> {
        let interaction = self.between(blocker, target).await?;
        let flag = interaction.block_flag_for(&target);
        self.write_flag(&interaction, flag, blocked).await
    }

    /// Sets or clears the mute `muter` holds on `target`.
    pub async fn mute(&self, muter: UserId, target: UserId, muted: bool) -> DataResult<Interaction> {
        let interaction = self.between(muter, target).await?;
        let flag = interaction.mute_flag_for(&target);
        self.write_flag(&interaction, flag, muted).await
    }

    async fn write_flag(
        &self,
        interaction: &Interaction,
        flag: InteractionFlag,
        value: bool,
    ) -> DataResult<Interaction> {
        tracing::debug!(interaction = %interaction.id, ?flag, value, "writing interaction flag");
        self.client
            .from::<Interaction>()
            .update(&flag.patch(value))?
            .eq(InteractionColumn::Id, interaction.id)
            .one()
            .await
    }
}
