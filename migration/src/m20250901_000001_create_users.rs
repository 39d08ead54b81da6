use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    Subscription,
    EmailVerified,
    OtpCode,
    OtpExpiry,
    ResetToken,
    ResetTokenExpiry,
    StripeSubscriptionId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserRole {
    #[sea_orm(iden = "user_role")]
    Enum,
    #[sea_orm(iden = "user")]
    User,
    #[sea_orm(iden = "admin")]
    Admin,
}

#[derive(DeriveIden)]
enum SubscriptionTier {
    #[sea_orm(iden = "subscription_tier")]
    Enum,
    #[sea_orm(iden = "free")]
    Free,
    #[sea_orm(iden = "paid")]
    Paid,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(UserRole::Enum)
                    .values([UserRole::User, UserRole::Admin])
                    .to_owned(),
            )
            .await?;
        manager
            .create_type(
                Type::create()
                    .as_enum(SubscriptionTier::Enum)
                    .values([SubscriptionTier::Free, SubscriptionTier::Paid])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .enumeration(UserRole::Enum, [UserRole::User, UserRole::Admin])
                            .not_null()
                            .default("user"),
                    )
                    .col(
                        ColumnDef::new(Users::Subscription)
                            .enumeration(
                                SubscriptionTier::Enum,
                                [SubscriptionTier::Free, SubscriptionTier::Paid],
                            )
                            .not_null()
                            .default("free"),
                    )
                    .col(
                        ColumnDef::new(Users::EmailVerified)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Users::OtpCode).string().null())
                    .col(ColumnDef::new(Users::OtpExpiry).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Users::ResetToken).string().null().unique_key())
                    .col(
                        ColumnDef::new(Users::ResetTokenExpiry)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Users::StripeSubscriptionId).string().null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(SubscriptionTier::Enum).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(UserRole::Enum).to_owned())
            .await?;
        Ok(())
    }
}
